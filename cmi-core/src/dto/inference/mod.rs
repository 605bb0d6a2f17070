//! Inference DTOs for the model runtime

use serde::{Deserialize, Serialize};

use crate::domain::inference::InferenceRequest;

/// JSON body sent to InvokeModel for imported text-generation models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeModelBody {
    pub prompt: String,
    pub temperature: f32,
    pub max_gen_len: u32,
    pub top_p: f32,
}

impl From<&InferenceRequest> for InvokeModelBody {
    fn from(request: &InferenceRequest) -> Self {
        Self {
            prompt: request.prompt().to_string(),
            temperature: request.temperature(),
            max_gen_len: request.max_tokens(),
            top_p: request.top_p(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_uses_max_gen_len() {
        let request = InferenceRequest::with_params("hi", 0.5, 256, 0.75).unwrap();
        let body = serde_json::to_value(InvokeModelBody::from(&request)).unwrap();

        assert_eq!(body["prompt"], "hi");
        assert_eq!(body["max_gen_len"], 256);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["top_p"], 0.75);
        assert!(body.get("max_tokens").is_none());
    }
}
