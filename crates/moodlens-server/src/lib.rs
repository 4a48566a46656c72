//! MoodLens Server
//!
//! HTTP entrypoint for mood analysis, crisis detection and summarization.
//! Each request is forwarded to the configured inference provider and the
//! provider's answer is normalized into one flat JSON result.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use axum::http::HeaderValue;
use config::ServerConfig;
use handlers::{create_router, AppState};
use moodlens_domain::OperationKind;
use moodlens_gateway::{GatewayError, HttpGateway};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Gateway could not be created
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the CORS layer for the allowed origins
///
/// `"*"` anywhere in the list allows any origin. Origins that are not valid
/// header values are skipped; `ServerConfig::validate` rejects them earlier.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the HTTP gateway described by `config`
pub fn build_gateway(config: &ServerConfig) -> Result<HttpGateway, ServerError> {
    let api_key = config.api_key();
    if api_key.is_none() {
        warn!(
            "No API key found in ${}; calling providers without authentication",
            config.api_key_env
        );
    }

    let gateway = HttpGateway::new(config.endpoints(), config.request_timeout())?
        .with_api_key(api_key)
        .with_max_attempts(config.max_attempts);
    Ok(gateway)
}

/// Start the MoodLens HTTP server
///
/// Validates configuration, builds the gateway and router, and serves until
/// Ctrl-C is received.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting MoodLens server");
    info!("Bind address: {}", config.bind_addr());
    info!("Request timeout: {} seconds", config.request_timeout_secs);
    info!("Max attempts: {}", config.max_attempts);
    info!("Mirror upstream status: {}", config.mirror_upstream_status);
    for kind in OperationKind::ALL {
        let provider = config.providers.get(kind);
        info!("{}: {} ({})", kind, provider.endpoint, provider.contract);
    }

    let gateway = build_gateway(&config)?;
    let state = AppState::new(gateway, config.contracts())
        .with_mirror_upstream_status(config.mirror_upstream_status);

    let app = create_router(state).layer(cors_layer(&config.cors_allow_origins));

    // Bind and serve
    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("MoodLens listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
