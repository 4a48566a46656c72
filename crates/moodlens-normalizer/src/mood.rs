//! Mood analysis parsing
//!
//! Emotion labels keep the provider's casing.

use crate::shape::{describe, json_body, label_scores, stable_max};
use moodlens_domain::{
    MoodResult, NormalizationError, OperationKind, ProviderContract, UpstreamBody,
};
use serde_json::Value;

/// Extract the dominant emotion from a successful response
pub fn analyze(
    contract: &ProviderContract,
    body: &UpstreamBody,
) -> Result<MoodResult, NormalizationError> {
    match contract {
        ProviderContract::LabelScores => {
            let pairs = label_scores(contract, json_body(contract, body)?)?;
            let top = stable_max(&pairs)
                .ok_or_else(|| NormalizationError::malformed(contract, "empty array"))?;
            Ok(MoodResult {
                emotion: top.label.clone(),
            })
        }
        ProviderContract::FreeText { field } => {
            let text = free_text(contract, field.as_deref(), body)?;
            let emotion = text.trim();
            if emotion.is_empty() {
                return Err(NormalizationError::malformed(contract, "blank text"));
            }
            Ok(MoodResult {
                emotion: emotion.to_string(),
            })
        }
        _ => Err(NormalizationError::ContractMismatch {
            kind: OperationKind::MoodAnalysis,
            contract: contract.clone(),
        }),
    }
}

/// Locate the free-text answer in the body
///
/// With no field the body itself is the answer. With a field, the answer is
/// read from the body object, or from the first element of a sequence
/// (`[{"generated_text": "..."}]`).
fn free_text<'a>(
    contract: &ProviderContract,
    field: Option<&str>,
    body: &'a UpstreamBody,
) -> Result<&'a str, NormalizationError> {
    let field = match field {
        Some(field) => field,
        None => {
            return match body {
                UpstreamBody::Text(text) => Ok(text.as_str()),
                UpstreamBody::Json(Value::String(text)) => Ok(text.as_str()),
                UpstreamBody::Json(other) => {
                    Err(NormalizationError::malformed(contract, describe(other)))
                }
            }
        }
    };

    let value = json_body(contract, body)?;
    let holder = match value {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| NormalizationError::malformed(contract, "empty array"))?,
        other => other,
    };

    holder
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| NormalizationError::malformed(contract, describe(holder)))
}
