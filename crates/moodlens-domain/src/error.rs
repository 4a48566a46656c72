//! Classified normalization failures

use crate::{OperationKind, ProviderContract};
use thiserror::Error;

/// Why an upstream response could not be turned into a result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    /// Provider was reachable but rejected the call or reported an error
    #[error("{message}")]
    UpstreamError {
        /// Status code returned by the provider
        status_code: u16,
        /// Error message extracted from the body
        message: String,
    },

    /// Call succeeded but the body does not match the contract
    #[error("Unexpected response shape: expected {expected_shape}, received {received}")]
    MalformedShape {
        /// Shape the contract expects
        expected_shape: String,
        /// What was actually found
        received: String,
    },

    /// Input text was blank
    #[error("Input text is empty")]
    EmptyInput,

    /// Configured contract cannot serve the requested operation
    #[error("Provider contract '{contract}' cannot serve {kind}")]
    ContractMismatch {
        /// Requested operation
        kind: OperationKind,
        /// Configured contract
        contract: ProviderContract,
    },
}

impl NormalizationError {
    /// Build a `MalformedShape` for `contract`
    pub fn malformed(contract: &ProviderContract, received: impl Into<String>) -> Self {
        NormalizationError::MalformedShape {
            expected_shape: contract.expected_shape(),
            received: received.into(),
        }
    }
}
