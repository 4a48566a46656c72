//! Summarization parsing

use crate::shape::{describe, json_body};
use moodlens_domain::result::SHORT_INPUT_NOTE;
use moodlens_domain::{NormalizationError, OperationKind, ProviderContract, SummaryResult, UpstreamBody};
use serde_json::Value;

/// Inputs with fewer whitespace-delimited tokens are echoed, not summarized
pub const MIN_SUMMARY_TOKENS: usize = 10;

/// Echo inputs too short to summarize
pub fn short_input(original_text: &str) -> Option<SummaryResult> {
    if original_text.split_whitespace().count() >= MIN_SUMMARY_TOKENS {
        return None;
    }

    Some(SummaryResult {
        summary: original_text.to_string(),
        note: Some(SHORT_INPUT_NOTE.to_string()),
    })
}

/// Pull the summary out of a successful response
pub fn extract(
    contract: &ProviderContract,
    body: &UpstreamBody,
) -> Result<SummaryResult, NormalizationError> {
    let field = match contract {
        ProviderContract::SummaryText { field } => field,
        _ => {
            return Err(NormalizationError::ContractMismatch {
                kind: OperationKind::Summarization,
                contract: contract.clone(),
            })
        }
    };

    let value = json_body(contract, body)?;
    let first = match value {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| NormalizationError::malformed(contract, "empty array"))?,
        other => return Err(NormalizationError::malformed(contract, describe(other))),
    };

    let summary = first
        .get(field.as_str())
        .and_then(Value::as_str)
        .ok_or_else(|| {
            NormalizationError::malformed(contract, format!("first element is {}", describe(first)))
        })?;

    Ok(SummaryResult {
        summary: summary.to_string(),
        note: None,
    })
}
