//! Model runtime client
//!
//! Invokes imported models and returns the decoded body together with the
//! response headers, which carry token counts and latency.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::config::retry::RetryConfig;
use aws_sdk_bedrockruntime::config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_smithy_runtime_api::box_error::BoxError;
use aws_smithy_runtime_api::client::interceptors::Intercept;
use aws_smithy_runtime_api::client::interceptors::context::BeforeDeserializationInterceptorContextRef;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_types::config_bag::ConfigBag;
use cmi_core::domain::inference::{InferenceRequest, InferenceResult};
use cmi_core::dto::inference::InvokeModelBody;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

const JSON_CONTENT_TYPE: &str = "application/json";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(300);
const READ_TIMEOUT: Duration = Duration::from_secs(300);
const SDK_MAX_ATTEMPTS: u32 = 3;

/// Remote inference API
#[async_trait]
pub trait InferenceApi: Send + Sync {
    /// Runs one inference request against a model
    ///
    /// # Arguments
    /// * `model_id` - Model identifier (the imported model ARN)
    /// * `request` - The generation request
    ///
    /// # Returns
    /// The decoded response body and headers
    async fn invoke_model(&self, model_id: &str, request: &InferenceRequest)
    -> Result<InferenceResult>;
}

/// Bedrock runtime implementation of [`InferenceApi`]
#[derive(Debug, Clone)]
pub struct BedrockRuntimeClient {
    client: Client,
}

impl BedrockRuntimeClient {
    /// Creates a runtime client with long connect/read timeouts
    ///
    /// Imported models can take minutes to answer the first request, so the
    /// timeouts are far above the SDK defaults.
    pub fn new(config: &SdkConfig) -> Self {
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build();

        let runtime_config = aws_sdk_bedrockruntime::config::Builder::from(config)
            .timeout_config(timeouts)
            .retry_config(RetryConfig::standard().with_max_attempts(SDK_MAX_ATTEMPTS))
            .build();

        Self {
            client: Client::from_conf(runtime_config),
        }
    }

    /// Wraps an already configured SDK client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InferenceApi for BedrockRuntimeClient {
    async fn invoke_model(
        &self,
        model_id: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceResult> {
        let body = serde_json::to_vec(&InvokeModelBody::from(request))
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to encode body: {}", e)))?;

        let capture = HeaderCapture::default();

        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Blob::new(body))
            .customize()
            .interceptor(capture.clone())
            .send()
            .await
            .map_err(|e| ClientError::aws("InvokeModel", e))?;

        let body = serde_json::from_slice(output.body().as_ref()).map_err(|e| {
            ClientError::ParseError(format!("Failed to parse model response: {}", e))
        })?;

        let headers = capture.take();
        debug!("InvokeModel returned {} header(s)", headers.len());

        Ok(InferenceResult::new(body, headers))
    }
}

/// Records the raw HTTP response headers of one operation
#[derive(Debug, Clone, Default)]
struct HeaderCapture {
    headers: Arc<Mutex<HashMap<String, String>>>,
}

impl HeaderCapture {
    fn take(&self) -> HashMap<String, String> {
        match self.headers.lock() {
            Ok(mut headers) => std::mem::take(&mut *headers),
            Err(_) => HashMap::new(),
        }
    }
}

impl Intercept for HeaderCapture {
    fn name(&self) -> &'static str {
        "HeaderCapture"
    }

    fn read_after_transmit(
        &self,
        context: &BeforeDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> std::result::Result<(), BoxError> {
        if let Ok(mut headers) = self.headers.lock() {
            // Retried attempts overwrite earlier ones; only the last response counts.
            headers.clear();
            for (name, value) in context.response().headers().iter() {
                headers.insert(name.to_ascii_lowercase(), value.to_string());
            }
        }
        Ok(())
    }
}
