//! MoodLens Response Normalizer
//!
//! Turns raw provider responses into stable [`NormalizedResult`]s, or into
//! classified [`NormalizationError`]s. Never both.
//!
//! # Order of evaluation
//!
//! 1. Input checks: blank text, contract/operation mismatch
//! 2. Summarization short-circuit for inputs under [`MIN_SUMMARY_TOKENS`]
//! 3. Failure classification, shared by every operation
//! 4. Contract-specific shape parsing
//!
//! Steps 1 and 2 need no upstream response and are exposed as
//! [`short_circuit`] so callers can skip the provider call entirely.
//!
//! # Examples
//!
//! ```
//! use moodlens_domain::{NormalizedResult, OperationKind, ProviderContract, RawUpstreamResponse};
//! use moodlens_normalizer::normalize;
//! use serde_json::json;
//!
//! let raw = RawUpstreamResponse::json(
//!     200,
//!     json!([{"label": "joy", "score": 0.8}, {"label": "anger", "score": 0.8}]),
//! );
//! let result = normalize(
//!     OperationKind::MoodAnalysis,
//!     &ProviderContract::LabelScores,
//!     &raw,
//!     "what a day",
//! )
//! .unwrap();
//!
//! match result {
//!     NormalizedResult::Mood(mood) => assert_eq!(mood.emotion, "joy"),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

#![warn(missing_docs)]

pub mod classify;
pub mod crisis;
pub mod mood;
pub mod summary;

mod shape;

use moodlens_domain::{
    NormalizationError, NormalizedResult, OperationKind, ProviderContract, RawUpstreamResponse,
};

pub use classify::classify_failure;
pub use summary::MIN_SUMMARY_TOKENS;

/// Normalize one upstream response for `kind`
///
/// `original_text` is the text that was sent upstream; it decides the
/// summarization short-circuit.
pub fn normalize(
    kind: OperationKind,
    contract: &ProviderContract,
    raw: &RawUpstreamResponse,
    original_text: &str,
) -> Result<NormalizedResult, NormalizationError> {
    if let Some(result) = short_circuit(kind, contract, original_text)? {
        return Ok(result);
    }

    classify_failure(raw)?;

    match kind {
        OperationKind::MoodAnalysis => mood::analyze(contract, &raw.body).map(Into::into),
        OperationKind::CrisisDetection => crisis::detect(contract, &raw.body).map(Into::into),
        OperationKind::Summarization => summary::extract(contract, &raw.body).map(Into::into),
    }
}

/// Decide what can be decided before any upstream call
///
/// Returns `Ok(Some(result))` when the answer does not depend on the provider,
/// `Ok(None)` when the provider must be consulted.
pub fn short_circuit(
    kind: OperationKind,
    contract: &ProviderContract,
    original_text: &str,
) -> Result<Option<NormalizedResult>, NormalizationError> {
    if original_text.trim().is_empty() {
        return Err(NormalizationError::EmptyInput);
    }

    if !contract.supports(kind) {
        return Err(NormalizationError::ContractMismatch {
            kind,
            contract: contract.clone(),
        });
    }

    if kind == OperationKind::Summarization {
        return Ok(summary::short_input(original_text).map(Into::into));
    }

    Ok(None)
}
