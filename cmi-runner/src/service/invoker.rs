//! Retrying inference invoker
//!
//! Issues one logical inference request, retrying any failed attempt up to a
//! fixed bound with a fixed delay in between. Failures are not classified:
//! every error is retried the same way.

use cmi_client::InferenceApi;
use cmi_core::domain::inference::{InferenceRequest, InferenceResult};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::error::InvokeError;

/// Fixed-delay retry bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: NonZeroU32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// One attempt, no retry
    pub fn once() -> Self {
        Self::new(NonZeroU32::MIN, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> NonZeroU32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    /// 10 attempts, 30 seconds apart
    fn default() -> Self {
        Self::new(NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN), Duration::from_secs(30))
    }
}

/// Runs inference requests against one model with bounded retries
#[derive(Clone)]
pub struct RetryingInvoker {
    api: Arc<dyn InferenceApi>,
    model_id: String,
}

impl RetryingInvoker {
    /// Creates an invoker for a model
    ///
    /// # Arguments
    /// * `api` - Inference API used for every attempt
    /// * `model_id` - Model identifier (the imported model ARN)
    pub fn new(api: Arc<dyn InferenceApi>, model_id: impl Into<String>) -> Self {
        Self {
            api,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Invokes the model, retrying failed attempts
    ///
    /// Attempts run strictly one after another. The first success is
    /// returned unchanged. After a failed attempt that is not the last one the
    /// invoker sleeps for the policy delay; a failed last attempt returns
    /// [`InvokeError::ExhaustedRetries`] straight away.
    pub async fn invoke(
        &self,
        request: &InferenceRequest,
        policy: RetryPolicy,
    ) -> Result<InferenceResult, InvokeError> {
        let max_attempts = policy.max_attempts.get();
        let mut attempt = 0;

        info!("Generating response using model {}", self.model_id);

        loop {
            attempt += 1;
            info!("Inference attempt {}/{}", attempt, max_attempts);

            match self.api.invoke_model(&self.model_id, request).await {
                Ok(result) => {
                    info!("Response generated successfully on attempt {}", attempt);
                    return Ok(result);
                }
                Err(e) => {
                    error!("Attempt {}/{} failed: {}", attempt, max_attempts, e);

                    if attempt >= max_attempts {
                        error!(
                            "Failed to get response after {} attempt(s)",
                            max_attempts
                        );
                        return Err(InvokeError::ExhaustedRetries {
                            attempts: attempt,
                            last_error: e,
                        });
                    }

                    info!("Retrying in {:?}", policy.delay);
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockInference, assert_slept};
    use serde_json::json;
    use tokio::time::Instant;

    fn request() -> InferenceRequest {
        InferenceRequest::new("How many clips did Natalia sell?").unwrap()
    }

    fn policy(max_attempts: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy::new(NonZeroU32::new(max_attempts).unwrap(), delay)
    }

    #[tokio::test]
    async fn test_fail_fail_succeed_returns_third_result() {
        let api = Arc::new(MockInference::new(vec![
            MockInference::failure("throttled"),
            MockInference::failure("model not ready"),
            MockInference::success(json!({"text": "42"})),
        ]));
        let invoker = RetryingInvoker::new(api.clone(), "arn:model");

        let result = invoker
            .invoke(&request(), policy(3, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(result.body, json!({"text": "42"}));
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_all_attempts_fail() {
        let api = Arc::new(MockInference::always_failing("unavailable"));
        let invoker = RetryingInvoker::new(api.clone(), "arn:model");

        let err = invoker
            .invoke(&request(), policy(2, Duration::ZERO))
            .await
            .unwrap_err();

        let InvokeError::ExhaustedRetries { attempts, last_error } = err;
        assert_eq!(attempts, 2);
        assert!(last_error.to_string().contains("unavailable"));
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_sleeps_between_attempts_only() {
        let api = Arc::new(MockInference::always_failing("unavailable"));
        let invoker = RetryingInvoker::new(api.clone(), "arn:model");
        let start = Instant::now();

        let result = invoker
            .invoke(&request(), policy(4, Duration::from_secs(30)))
            .await;

        assert!(matches!(result, Err(InvokeError::ExhaustedRetries { attempts: 4, .. })));
        assert_eq!(api.calls(), 4);
        assert_slept(start.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_kth_attempt_stops_retrying() {
        let api = Arc::new(MockInference::new(vec![
            MockInference::failure("timeout"),
            MockInference::success(json!({"generation": "72"})),
            MockInference::success(json!({"generation": "unused"})),
        ]));
        let invoker = RetryingInvoker::new(api.clone(), "arn:model");
        let start = Instant::now();

        let result = invoker
            .invoke(&request(), policy(5, Duration::from_secs(30)))
            .await
            .unwrap();

        assert_eq!(result.generation(), Some("72"));
        assert_eq!(api.calls(), 2);
        assert_slept(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_does_not_sleep() {
        let api = Arc::new(MockInference::always_failing("bad request"));
        let invoker = RetryingInvoker::new(api.clone(), "arn:model");
        let start = Instant::now();

        let result = invoker.invoke(&request(), RetryPolicy::once()).await;

        assert!(matches!(result, Err(InvokeError::ExhaustedRetries { attempts: 1, .. })));
        assert_eq!(api.calls(), 1);
        assert_slept(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_passes_model_and_request_through() {
        let api = Arc::new(MockInference::new(vec![MockInference::success(json!({}))]));
        let invoker = RetryingInvoker::new(api.clone(), "arn:aws:bedrock:us-east-1:1:imported-model/abc");

        invoker.invoke(&request(), RetryPolicy::default()).await.unwrap();

        let seen = api.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "arn:aws:bedrock:us-east-1:1:imported-model/abc");
        assert_eq!(seen[0].1, request());
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts().get(), 10);
        assert_eq!(policy.delay(), Duration::from_secs(30));
    }
}
