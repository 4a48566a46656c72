//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{OperationKind, RawUpstreamResponse};
use std::future::Future;

/// Trait for calling upstream inference providers
///
/// Implemented by the infrastructure layer (moodlens-gateway). One call per
/// operation invocation; the response is returned untouched.
pub trait InferenceGateway: Send + Sync + 'static {
    /// Error type for transport failures (no status was obtained)
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `text` to the provider configured for `kind`
    fn infer(
        &self,
        kind: OperationKind,
        text: &str,
    ) -> impl Future<Output = Result<RawUpstreamResponse, Self::Error>> + Send;
}
