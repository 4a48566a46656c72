//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, provider
//! endpoints, provider contracts and error-status policy.

use axum::http::HeaderValue;
use moodlens_domain::{OperationKind, ProviderContract};
use moodlens_gateway::http::MAX_ATTEMPTS_LIMIT;
use moodlens_gateway::ProviderEndpoint;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Environment variable holding the provider API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Timeout for a single provider request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Attempts per provider call; only transport failures are retried
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Return failures with a matching HTTP status instead of 200
    #[serde(default)]
    pub mirror_upstream_status: bool,

    /// Origins allowed by CORS; "*" allows any origin
    #[serde(default = "default_cors_allow_origins")]
    pub cors_allow_origins: Vec<String>,

    /// One provider per operation
    pub providers: ProvidersConfig,
}

/// Providers for the three operations
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Emotion classification provider
    pub mood_analysis: ProviderConfig,

    /// Crisis detection provider
    pub crisis_detection: ProviderConfig,

    /// Summarization provider
    pub summarization: ProviderConfig,
}

/// Provider configuration for one operation
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Inference URL
    pub endpoint: String,

    /// How the provider shapes its response
    pub contract: ProviderContract,

    /// Extra request parameters (e.g. candidate labels, length limits)
    #[serde(default)]
    pub parameters: Option<Value>,

    /// Template for generative providers; `{text}` is replaced by the input
    #[serde(default)]
    pub prompt_template: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_api_key_env() -> String {
    "HF_API_KEY".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

fn default_cors_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl ProvidersConfig {
    /// Provider configured for `kind`
    pub fn get(&self, kind: OperationKind) -> &ProviderConfig {
        match kind {
            OperationKind::MoodAnalysis => &self.mood_analysis,
            OperationKind::CrisisDetection => &self.crisis_detection,
            OperationKind::Summarization => &self.summarization,
        }
    }
}

impl ProviderConfig {
    /// Gateway endpoint for this provider
    pub fn to_endpoint(&self) -> ProviderEndpoint {
        ProviderEndpoint {
            url: self.endpoint.clone(),
            parameters: self.parameters.clone(),
            prompt_template: self.prompt_template.clone(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field the server relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::MissingField("bind_address".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "max_attempts must be between 1 and {}",
                MAX_ATTEMPTS_LIMIT
            )));
        }

        for origin in &self.cors_allow_origins {
            if origin != "*" && origin.parse::<HeaderValue>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "cors_allow_origins entry '{}' is not a valid origin",
                    origin
                )));
            }
        }

        for kind in OperationKind::ALL {
            let provider = self.providers.get(kind);
            if provider.endpoint.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "providers.{}.endpoint",
                    kind
                )));
            }
            if !provider.contract.supports(kind) {
                return Err(ConfigError::Invalid(format!(
                    "contract '{}' cannot serve {}",
                    provider.contract, kind
                )));
            }
            if let Some(parameters) = &provider.parameters {
                if !parameters.is_object() {
                    return Err(ConfigError::Invalid(format!(
                        "providers.{}.parameters must be a table",
                        kind
                    )));
                }
            }
        }

        Ok(())
    }

    /// Default configuration: Hugging Face hosted models
    pub fn default_config() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            mirror_upstream_status: false,
            cors_allow_origins: default_cors_allow_origins(),
            providers: ProvidersConfig {
                mood_analysis: ProviderConfig {
                    endpoint: "https://api-inference.huggingface.co/models/j-hartmann/emotion-english-distilroberta-base".to_string(),
                    contract: ProviderContract::LabelScores,
                    parameters: None,
                    prompt_template: None,
                },
                crisis_detection: ProviderConfig {
                    endpoint: "https://api-inference.huggingface.co/models/facebook/bart-large-mnli".to_string(),
                    contract: ProviderContract::zero_shot(),
                    parameters: Some(json!({
                        "candidate_labels": ["crisis", "support", "neutral"]
                    })),
                    prompt_template: None,
                },
                summarization: ProviderConfig {
                    endpoint: "https://api-inference.huggingface.co/models/facebook/bart-large-cnn".to_string(),
                    contract: ProviderContract::summary_text(),
                    parameters: Some(json!({"max_length": 150, "min_length": 30})),
                    prompt_template: None,
                },
            },
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Provider request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the provider API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    /// Gateway endpoints keyed by operation
    pub fn endpoints(&self) -> HashMap<OperationKind, ProviderEndpoint> {
        OperationKind::ALL
            .into_iter()
            .map(|kind| (kind, self.providers.get(kind).to_endpoint()))
            .collect()
    }

    /// Provider contracts keyed by operation
    pub fn contracts(&self) -> HashMap<OperationKind, ProviderContract> {
        OperationKind::ALL
            .into_iter()
            .map(|kind| (kind, self.providers.get(kind).contract.clone()))
            .collect()
    }
}
