//! MoodLens Inference Gateway
//!
//! Implementations of the `InferenceGateway` trait from `moodlens-domain`.
//! A gateway sends one text payload to the provider configured for an
//! operation and hands back the untouched status and body.
//!
//! # Gateways
//!
//! - `MockGateway`: Canned responses for testing
//! - `HttpGateway`: Hosted inference endpoints over HTTP
//!
//! # Examples
//!
//! ```
//! use moodlens_domain::traits::InferenceGateway;
//! use moodlens_domain::{OperationKind, RawUpstreamResponse};
//! use moodlens_gateway::MockGateway;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let gateway = MockGateway::new(RawUpstreamResponse::text(200, "joy"));
//! let raw = gateway.infer(OperationKind::MoodAnalysis, "hello").await.unwrap();
//! assert_eq!(raw.status_code, 200);
//! # }
//! ```

#![warn(missing_docs)]

pub mod http;

use moodlens_domain::traits::InferenceGateway;
use moodlens_domain::{OperationKind, RawUpstreamResponse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use http::{HttpGateway, ProviderEndpoint};

/// Errors raised before an upstream status was obtained
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Provider did not answer in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// No endpoint configured for the operation
    #[error("No provider configured for {0}")]
    NotConfigured(OperationKind),

    /// HTTP client could not be built
    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else {
            GatewayError::Communication(e.to_string())
        }
    }
}

/// Mock gateway for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use moodlens_domain::{OperationKind, RawUpstreamResponse};
/// use moodlens_gateway::MockGateway;
///
/// let mut gateway = MockGateway::default();
/// gateway.add_response(OperationKind::Summarization, RawUpstreamResponse::text(503, "busy"));
/// gateway.add_failure(OperationKind::CrisisDetection);
/// assert_eq!(gateway.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockGateway {
    default_response: RawUpstreamResponse,
    responses: Arc<Mutex<HashMap<OperationKind, MockReply>>>,
    call_count: Arc<AtomicUsize>,
}

#[derive(Debug, Clone)]
enum MockReply {
    Response(RawUpstreamResponse),
    Failure,
}

impl MockGateway {
    /// Create a mock returning `response` for every operation
    pub fn new(response: RawUpstreamResponse) -> Self {
        Self {
            default_response: response,
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a specific response for one operation
    pub fn add_response(&mut self, kind: OperationKind, response: RawUpstreamResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, MockReply::Response(response));
    }

    /// Configure a transport failure for one operation
    pub fn add_failure(&mut self, kind: OperationKind) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, MockReply::Failure);
    }

    /// Get the number of times infer was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn reply(&self, kind: OperationKind) -> Result<RawUpstreamResponse, GatewayError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        match responses.get(&kind) {
            Some(MockReply::Response(response)) => Ok(response.clone()),
            Some(MockReply::Failure) => Err(GatewayError::Communication(
                "Mock transport failure".to_string(),
            )),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(RawUpstreamResponse::json(200, serde_json::Value::Null))
    }
}

impl InferenceGateway for MockGateway {
    type Error = GatewayError;

    async fn infer(
        &self,
        kind: OperationKind,
        _text: &str,
    ) -> Result<RawUpstreamResponse, Self::Error> {
        self.reply(kind)
    }
}
