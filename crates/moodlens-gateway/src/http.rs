//! HTTP Gateway Implementation
//!
//! Sends text to hosted inference endpoints (Hugging Face Inference API and
//! compatible services) and returns their raw status and body.
//!
//! # Features
//!
//! - One endpoint per operation, each with optional request parameters
//! - Bearer-token authentication
//! - Prompt templates for generative providers
//! - Retry with exponential backoff on transport failures only
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use moodlens_domain::OperationKind;
//! use moodlens_gateway::{HttpGateway, ProviderEndpoint};
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! let mut endpoints = HashMap::new();
//! endpoints.insert(
//!     OperationKind::MoodAnalysis,
//!     ProviderEndpoint::new("https://api-inference.huggingface.co/models/j-hartmann/emotion-english-distilroberta-base"),
//! );
//!
//! let gateway = HttpGateway::new(endpoints, Duration::from_secs(30))
//!     .unwrap()
//!     .with_api_key(Some("hf_xxx".to_string()));
//! ```

use crate::GatewayError;
use moodlens_domain::traits::InferenceGateway;
use moodlens_domain::{OperationKind, RawUpstreamResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for provider requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts (no retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Upper bound on attempts per call; backoff before the last one is 256s
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Placeholder replaced by the input text in prompt templates
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Where and how to call the provider for one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Full inference URL
    pub url: String,

    /// Extra `parameters` object sent with each request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    /// Template for `inputs`; `{text}` is replaced by the input text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

impl ProviderEndpoint {
    /// Endpoint with no parameters and no template
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parameters: None,
            prompt_template: None,
        }
    }

    /// Set the request parameters
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set the prompt template
    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Build the request body for `text`
    fn request(&self, text: &str) -> InferenceRequest {
        let inputs = match &self.prompt_template {
            Some(template) => template.replace(TEXT_PLACEHOLDER, text),
            None => text.to_string(),
        };

        InferenceRequest {
            inputs,
            parameters: self.parameters.clone(),
        }
    }
}

/// Request body for hosted inference APIs
#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

/// Gateway to hosted inference endpoints over HTTP
pub struct HttpGateway {
    endpoints: HashMap<OperationKind, ProviderEndpoint>,
    client: reqwest::Client,
    api_key: Option<String>,
    max_attempts: u32,
}

impl HttpGateway {
    /// Create a gateway for the given endpoints
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Setup` if the HTTP client cannot be built
    pub fn new(
        endpoints: HashMap<OperationKind, ProviderEndpoint>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Setup(e.to_string()))?;

        Ok(Self {
            endpoints,
            client,
            api_key: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Set the bearer token sent with every request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    /// Set the maximum number of attempts per call, clamped to
    /// `1..=MAX_ATTEMPTS_LIMIT`
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT);
        self
    }

    /// Endpoint configured for `kind`, if any
    pub fn endpoint(&self, kind: OperationKind) -> Option<&ProviderEndpoint> {
        self.endpoints.get(&kind)
    }

    /// Send `text` to the provider for `kind`
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No endpoint is configured for `kind`
    /// - The provider cannot be reached after all attempts
    /// - The request times out
    ///
    /// HTTP error statuses are not errors here; they are returned for the
    /// normalizer to classify.
    pub async fn send(
        &self,
        kind: OperationKind,
        text: &str,
    ) -> Result<RawUpstreamResponse, GatewayError> {
        let endpoint = self
            .endpoints
            .get(&kind)
            .ok_or(GatewayError::NotConfigured(kind))?;
        let request_body = endpoint.request(text);

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            let mut request = self.client.post(&endpoint.url).json(&request_body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let bytes = response.bytes().await?;
                    let raw = RawUpstreamResponse::from_bytes(status, &bytes);
                    debug!(
                        operation = %kind,
                        status,
                        body = %raw.body_text(),
                        "Provider raw output"
                    );
                    return Ok(raw);
                }
                Err(e) => {
                    warn!(operation = %kind, attempt = attempts + 1, "Provider request failed: {}", e);
                    last_error = Some(GatewayError::from(e));
                }
            }

            attempts += 1;
            if attempts < self.max_attempts {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GatewayError::Communication("Max attempts exceeded".to_string())
        }))
    }
}

impl InferenceGateway for HttpGateway {
    type Error = GatewayError;

    async fn infer(
        &self,
        kind: OperationKind,
        text: &str,
    ) -> Result<RawUpstreamResponse, Self::Error> {
        self.send(kind, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> HttpGateway {
        let mut endpoints = HashMap::new();
        endpoints.insert(
            OperationKind::MoodAnalysis,
            ProviderEndpoint::new("http://localhost:9/models/emotion"),
        );
        HttpGateway::new(endpoints, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).unwrap()
    }

    #[test]
    fn test_gateway_creation() {
        let gateway = gateway();
        assert_eq!(gateway.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(gateway.api_key.is_none());
        assert!(gateway.endpoint(OperationKind::MoodAnalysis).is_some());
        assert!(gateway.endpoint(OperationKind::Summarization).is_none());
    }

    #[test]
    fn test_with_max_attempts_floor() {
        let gateway = gateway().with_max_attempts(0);
        assert_eq!(gateway.max_attempts, 1);
    }

    #[test]
    fn test_with_max_attempts_ceiling() {
        let gateway = gateway().with_max_attempts(u32::MAX);
        assert_eq!(gateway.max_attempts, MAX_ATTEMPTS_LIMIT);
    }

    #[test]
    fn test_empty_api_key_ignored() {
        let gateway = gateway().with_api_key(Some(String::new()));
        assert!(gateway.api_key.is_none());
    }

    #[test]
    fn test_request_plain() {
        let endpoint = ProviderEndpoint::new("http://x");
        let body = serde_json::to_value(endpoint.request("hello")).unwrap();
        assert_eq!(body, json!({"inputs": "hello"}));
    }

    #[test]
    fn test_request_with_parameters() {
        let endpoint = ProviderEndpoint::new("http://x")
            .with_parameters(json!({"max_length": 150, "min_length": 30}));
        let body = serde_json::to_value(endpoint.request("long text")).unwrap();
        assert_eq!(
            body,
            json!({"inputs": "long text", "parameters": {"max_length": 150, "min_length": 30}})
        );
    }

    #[test]
    fn test_request_with_template() {
        let endpoint = ProviderEndpoint::new("http://x")
            .with_prompt_template("Answer with one word, the emotion in: {text}");
        let body = serde_json::to_value(endpoint.request("I passed!")).unwrap();
        assert_eq!(
            body["inputs"],
            "Answer with one word, the emotion in: I passed!"
        );
    }

    #[tokio::test]
    async fn test_not_configured() {
        let result = gateway().send(OperationKind::Summarization, "text").await;
        assert!(matches!(
            result,
            Err(GatewayError::NotConfigured(OperationKind::Summarization))
        ));
    }

    #[tokio::test]
    async fn test_connection_error() {
        let mut endpoints = HashMap::new();
        endpoints.insert(
            OperationKind::MoodAnalysis,
            ProviderEndpoint::new("http://127.0.0.1:1/models/emotion"),
        );
        let gateway = HttpGateway::new(endpoints, Duration::from_secs(5)).unwrap();

        let result = gateway.send(OperationKind::MoodAnalysis, "test").await;
        match result {
            Err(GatewayError::Communication(_)) | Err(GatewayError::Timeout(_)) => {} // Expected
            other => panic!("Expected transport error, got {:?}", other),
        }
    }
}
