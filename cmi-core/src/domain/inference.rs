//! Inference domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

/// Response header carrying the number of input tokens
pub const INPUT_TOKEN_COUNT_HEADER: &str = "x-amzn-bedrock-input-token-count";
/// Response header carrying the number of output tokens
pub const OUTPUT_TOKEN_COUNT_HEADER: &str = "x-amzn-bedrock-output-token-count";
/// Response header carrying the invocation latency in milliseconds
pub const INVOCATION_LATENCY_HEADER: &str = "x-amzn-bedrock-invocation-latency";

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TOP_P: f32 = 0.9;

/// Rejected inference request parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRequest {
    #[error("temperature must be within [0, 1], got {0}")]
    Temperature(f32),

    #[error("top_p must be within [0, 1], got {0}")]
    TopP(f32),

    #[error("max_tokens must be greater than 0")]
    MaxTokens,

    #[error("prompt cannot be empty")]
    EmptyPrompt,
}

/// A single text-generation request
///
/// Fields are private so a constructed request is always within range.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    prompt: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl InferenceRequest {
    /// Creates a request with the default sampling parameters
    pub fn new(prompt: impl Into<String>) -> Result<Self, InvalidRequest> {
        Self::with_params(prompt, DEFAULT_TEMPERATURE, DEFAULT_MAX_TOKENS, DEFAULT_TOP_P)
    }

    /// Creates a request with explicit sampling parameters
    ///
    /// # Arguments
    /// * `prompt` - Prompt text, must not be empty
    /// * `temperature` - Randomness of generation, within [0, 1]
    /// * `max_tokens` - Maximum number of generated tokens, greater than 0
    /// * `top_p` - Nucleus sampling parameter, within [0, 1]
    pub fn with_params(
        prompt: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        top_p: f32,
    ) -> Result<Self, InvalidRequest> {
        let prompt = prompt.into();

        if prompt.is_empty() {
            return Err(InvalidRequest::EmptyPrompt);
        }
        if !(0.0..=1.0).contains(&temperature) {
            return Err(InvalidRequest::Temperature(temperature));
        }
        if !(0.0..=1.0).contains(&top_p) {
            return Err(InvalidRequest::TopP(top_p));
        }
        if max_tokens == 0 {
            return Err(InvalidRequest::MaxTokens);
        }

        Ok(Self {
            prompt,
            temperature,
            max_tokens,
            top_p,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }
}

/// Result of one successful invocation
///
/// `body` is the decoded JSON response, `headers` the response metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub body: JsonValue,
    pub headers: HashMap<String, String>,
}

impl InferenceResult {
    pub fn new(body: JsonValue, headers: HashMap<String, String>) -> Self {
        Self { body, headers }
    }

    /// Generated text, if the body carries one
    pub fn generation(&self) -> Option<&str> {
        self.body.get("generation").and_then(JsonValue::as_str)
    }

    pub fn generation_token_count(&self) -> Option<u64> {
        self.body
            .get("generation_token_count")
            .and_then(JsonValue::as_u64)
    }

    pub fn prompt_token_count(&self) -> Option<u64> {
        self.body.get("prompt_token_count").and_then(JsonValue::as_u64)
    }

    pub fn input_token_count(&self) -> Option<u64> {
        self.header_u64(INPUT_TOKEN_COUNT_HEADER)
    }

    pub fn output_token_count(&self) -> Option<u64> {
        self.header_u64(OUTPUT_TOKEN_COUNT_HEADER)
    }

    pub fn invocation_latency_ms(&self) -> Option<u64> {
        self.header_u64(INVOCATION_LATENCY_HEADER)
    }

    /// Header lookup is case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn header_u64(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|v| v.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request = InferenceRequest::new("hello").unwrap();
        assert_eq!(request.prompt(), "hello");
        assert_eq!(request.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(request.top_p(), DEFAULT_TOP_P);
    }

    #[test]
    fn test_request_bounds_are_inclusive() {
        assert!(InferenceRequest::with_params("p", 0.0, 1, 0.0).is_ok());
        assert!(InferenceRequest::with_params("p", 1.0, 1, 1.0).is_ok());
    }

    #[test]
    fn test_request_rejects_out_of_range() {
        assert_eq!(
            InferenceRequest::with_params("p", 1.5, 10, 0.9),
            Err(InvalidRequest::Temperature(1.5))
        );
        assert_eq!(
            InferenceRequest::with_params("p", 0.3, 10, -0.1),
            Err(InvalidRequest::TopP(-0.1))
        );
        assert_eq!(
            InferenceRequest::with_params("p", 0.3, 0, 0.9),
            Err(InvalidRequest::MaxTokens)
        );
        assert_eq!(
            InferenceRequest::with_params("", 0.3, 10, 0.9),
            Err(InvalidRequest::EmptyPrompt)
        );
    }

    #[test]
    fn test_request_keeps_whitespace_prompt() {
        let request = InferenceRequest::with_params("  \n", 0.3, 10, 0.9).unwrap();
        assert_eq!(request.prompt(), "  \n");
    }

    #[test]
    fn test_request_rejects_nan() {
        assert!(InferenceRequest::with_params("p", f32::NAN, 10, 0.9).is_err());
    }

    #[test]
    fn test_result_accessors() {
        let mut headers = HashMap::new();
        headers.insert("X-Amzn-Bedrock-Input-Token-Count".to_string(), "12".to_string());
        headers.insert(OUTPUT_TOKEN_COUNT_HEADER.to_string(), "34".to_string());
        headers.insert(INVOCATION_LATENCY_HEADER.to_string(), "812".to_string());

        let result = InferenceResult::new(
            json!({
                "generation": "72 clips",
                "generation_token_count": 34,
                "prompt_token_count": 12,
                "stop_reason": "stop"
            }),
            headers,
        );

        assert_eq!(result.generation(), Some("72 clips"));
        assert_eq!(result.generation_token_count(), Some(34));
        assert_eq!(result.prompt_token_count(), Some(12));
        assert_eq!(result.input_token_count(), Some(12));
        assert_eq!(result.output_token_count(), Some(34));
        assert_eq!(result.invocation_latency_ms(), Some(812));
    }

    #[test]
    fn test_result_missing_fields() {
        let result = InferenceResult::new(json!({"text": "42"}), HashMap::new());
        assert_eq!(result.generation(), None);
        assert_eq!(result.input_token_count(), None);
    }
}
