//! Shape helpers shared by the operation parsers

use moodlens_domain::{LabelScore, NormalizationError, ProviderContract, UpstreamBody};
use serde_json::Value;

/// Short description of a JSON value, used in `MalformedShape.received`
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) if items.is_empty() => "empty array".to_string(),
        Value::Array(items) => format!("array of {} element(s)", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
    }
}

/// The body as JSON, or `MalformedShape` when it is plain text
pub(crate) fn json_body<'a>(
    contract: &ProviderContract,
    body: &'a UpstreamBody,
) -> Result<&'a Value, NormalizationError> {
    match body {
        UpstreamBody::Json(value) => Ok(value),
        UpstreamBody::Text(_) => Err(NormalizationError::malformed(contract, "non-JSON text")),
    }
}

/// Unwrap one level of batch nesting: `[[a, b]]` becomes `[a, b]`
pub(crate) fn unnest(items: &[Value]) -> &[Value] {
    match items.first() {
        Some(Value::Array(inner)) => inner,
        _ => items,
    }
}

/// Parse `[{label, score}, ...]`, optionally nested one level
pub(crate) fn label_scores(
    contract: &ProviderContract,
    value: &Value,
) -> Result<Vec<LabelScore>, NormalizationError> {
    let items = value
        .as_array()
        .ok_or_else(|| NormalizationError::malformed(contract, describe(value)))?;

    unnest(items)
        .iter()
        .enumerate()
        .map(|(idx, item)| label_score(item).map_err(|e| {
            NormalizationError::malformed(contract, format!("element {}: {}", idx, e))
        }))
        .collect()
}

fn label_score(item: &Value) -> Result<LabelScore, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| format!("{} instead of object", describe(item)))?;

    let label = obj
        .get("label")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing or invalid 'label'".to_string())?;

    let score = obj
        .get("score")
        .ok_or_else(|| "missing or invalid 'score'".to_string())?;

    Ok(LabelScore::new(label, probability(score)?))
}

/// A score that is a finite number within `[0, 1]`
pub(crate) fn probability(value: &Value) -> Result<f64, String> {
    let score = value
        .as_f64()
        .ok_or_else(|| format!("score is {}", describe(value)))?;

    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(format!("score {} outside [0, 1]", score))
    }
}

/// Entry with the highest score; the first one wins ties
pub(crate) fn stable_max(pairs: &[LabelScore]) -> Option<&LabelScore> {
    pairs.iter().fold(None, |best: Option<&LabelScore>, pair| match best {
        Some(current) if pair.score <= current.score => Some(current),
        _ => Some(pair),
    })
}

/// Round to 4 decimal places
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
