//! MoodLens Domain Layer
//!
//! Shared data model for the MoodLens service. Every other crate depends on
//! the types defined here; this crate performs no I/O.
//!
//! ## Key Concepts
//!
//! - **Operation kind**: which of the three analyses a request asks for
//! - **Provider contract**: how a given provider shapes its response for an
//!   operation, chosen once at configuration time
//! - **Raw upstream response**: the untouched status and body of one provider call
//! - **Normalized result**: the stable, provider-independent answer
//! - **Normalization error**: a classified failure, never mixed with a result
//!
//! Everything here is request-scoped. Nothing is persisted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod error;
pub mod operation;
pub mod result;
pub mod traits;
pub mod upstream;

// Re-exports for convenience
pub use contract::ProviderContract;
pub use error::NormalizationError;
pub use operation::OperationKind;
pub use result::{CrisisResult, LabelScore, MoodResult, NormalizedResult, SummaryResult};
pub use upstream::{RawUpstreamResponse, UpstreamBody};
