//! HTTP request handlers for the MoodLens service.
//!
//! Every analysis endpoint takes `{"text": "..."}` and returns either the
//! flat result object for its operation or `{"error": "..."}`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use moodlens_domain::traits::InferenceGateway;
use moodlens_domain::{NormalizationError, NormalizedResult, OperationKind, ProviderContract};
use moodlens_normalizer::{normalize, short_circuit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shared application state
pub struct AppState<G> {
    /// Gateway to upstream inference providers
    pub gateway: Arc<G>,
    /// Provider contract per operation
    pub contracts: Arc<HashMap<OperationKind, ProviderContract>>,
    /// Return failures with a matching HTTP status instead of 200
    pub mirror_upstream_status: bool,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            contracts: Arc::clone(&self.contracts),
            mirror_upstream_status: self.mirror_upstream_status,
        }
    }
}

impl<G> AppState<G> {
    /// Create state from a gateway and the contracts it answers with
    pub fn new(gateway: G, contracts: HashMap<OperationKind, ProviderContract>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            contracts: Arc::new(contracts),
            mirror_upstream_status: false,
        }
    }

    /// Set the error-status policy
    pub fn with_mirror_upstream_status(mut self, mirror: bool) -> Self {
        self.mirror_upstream_status = mirror;
        self
    }
}

/// Analysis request body
#[derive(Debug, Deserialize)]
pub struct TextInput {
    /// Text to analyze
    pub text: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Operations with a configured contract
    pub operations: Vec<OperationStatus>,
}

/// Configured contract for one operation
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationStatus {
    /// Operation name
    pub operation: OperationKind,
    /// Contract name
    pub contract: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Why an operation produced no result
#[derive(Debug, Error)]
pub enum Failure {
    /// Normalizer rejected the input or the upstream response
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    /// Provider could not be reached
    #[error("{0}")]
    Gateway(String),

    /// No contract configured for the operation
    #[error("No provider configured for {0}")]
    NotConfigured(OperationKind),
}

impl Failure {
    /// HTTP status used when mirroring is enabled
    pub fn status_code(&self) -> StatusCode {
        match self {
            Failure::Normalization(NormalizationError::UpstreamError { status_code, .. }) => {
                StatusCode::from_u16(*status_code)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Failure::Normalization(NormalizationError::MalformedShape { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Failure::Normalization(NormalizationError::EmptyInput) => StatusCode::BAD_REQUEST,
            Failure::Normalization(NormalizationError::ContractMismatch { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Failure::Gateway(_) => StatusCode::BAD_GATEWAY,
            Failure::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error type
#[derive(Debug)]
pub struct AppError {
    failure: Failure,
    mirror_status: bool,
}

impl AppError {
    /// Wrap a failure with the status policy in force
    pub fn new(failure: Failure, mirror_status: bool) -> Self {
        Self {
            failure,
            mirror_status,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.mirror_status {
            self.failure.status_code()
        } else {
            StatusCode::OK
        };

        let body = Json(ErrorResponse {
            error: self.failure.to_string(),
        });
        (status, body).into_response()
    }
}

/// Run one operation end to end: input checks, provider call, normalization
pub async fn run_operation<G: InferenceGateway>(
    state: &AppState<G>,
    kind: OperationKind,
    text: &str,
) -> Result<NormalizedResult, Failure> {
    let contract = state
        .contracts
        .get(&kind)
        .ok_or(Failure::NotConfigured(kind))?;

    if let Some(result) = short_circuit(kind, contract, text)? {
        debug!("Answered without calling the provider");
        return Ok(result);
    }

    let raw = state
        .gateway
        .infer(kind, text)
        .await
        .map_err(|e| Failure::Gateway(e.to_string()))?;

    Ok(normalize(kind, contract, &raw, text)?)
}

async fn handle<G: InferenceGateway>(
    state: AppState<G>,
    kind: OperationKind,
    input: TextInput,
) -> Result<Json<NormalizedResult>, AppError> {
    let span = info_span!("request", id = %Uuid::now_v7(), operation = %kind);

    async move {
        match run_operation(&state, kind, &input.text).await {
            Ok(result) => {
                info!("Operation succeeded");
                Ok(Json(result))
            }
            Err(failure) => {
                warn!("Operation failed: {}", failure);
                Err(AppError::new(failure, state.mirror_upstream_status))
            }
        }
    }
    .instrument(span)
    .await
}

/// POST /analyze_mood - Dominant emotion of the text
async fn analyze_mood<G: InferenceGateway>(
    State(state): State<AppState<G>>,
    Json(input): Json<TextInput>,
) -> Result<Json<NormalizedResult>, AppError> {
    handle(state, OperationKind::MoodAnalysis, input).await
}

/// POST /detect_crisis - Whether the text signals a crisis
async fn detect_crisis<G: InferenceGateway>(
    State(state): State<AppState<G>>,
    Json(input): Json<TextInput>,
) -> Result<Json<NormalizedResult>, AppError> {
    handle(state, OperationKind::CrisisDetection, input).await
}

/// POST /summarize - Summary of the text
async fn summarize<G: InferenceGateway>(
    State(state): State<AppState<G>>,
    Json(input): Json<TextInput>,
) -> Result<Json<NormalizedResult>, AppError> {
    handle(state, OperationKind::Summarization, input).await
}

/// GET /health - Liveness and configured contracts
async fn health_check<G: InferenceGateway>(
    State(state): State<AppState<G>>,
) -> Json<HealthCheckResponse> {
    let operations = OperationKind::ALL
        .into_iter()
        .filter_map(|kind| {
            state.contracts.get(&kind).map(|contract| OperationStatus {
                operation: kind,
                contract: contract.name().to_string(),
            })
        })
        .collect::<Vec<_>>();

    let status = if operations.len() == OperationKind::ALL.len() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthCheckResponse {
        status: status.to_string(),
        operations,
    })
}

/// Create the axum router with all routes
pub fn create_router<G: InferenceGateway>(state: AppState<G>) -> AxumRouter {
    AxumRouter::new()
        .route("/analyze_mood", post(analyze_mood::<G>))
        .route("/detect_crisis", post(detect_crisis::<G>))
        .route("/summarize", post(summarize::<G>))
        .route("/health", get(health_check::<G>))
        .with_state(state)
}
