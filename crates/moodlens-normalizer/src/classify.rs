//! Failure classification shared by every operation
//!
//! Checks, in order:
//! 1. Status outside 2xx: upstream error, message from the body's `error`
//!    field when present, else the raw body text
//! 2. 2xx body carrying a non-null `error` field: upstream error with that
//!    field's value
//!
//! Anything else passes through to shape parsing.

use moodlens_domain::{NormalizationError, RawUpstreamResponse, UpstreamBody};
use serde_json::Value;

/// Reject responses that signal failure by status or by an embedded error
pub fn classify_failure(raw: &RawUpstreamResponse) -> Result<(), NormalizationError> {
    let embedded = embedded_error(&raw.body);

    if !raw.is_success() {
        return Err(NormalizationError::UpstreamError {
            status_code: raw.status_code,
            message: embedded.unwrap_or_else(|| raw.body_text()),
        });
    }

    match embedded {
        Some(message) => Err(NormalizationError::UpstreamError {
            status_code: raw.status_code,
            message,
        }),
        None => Ok(()),
    }
}

fn embedded_error(body: &UpstreamBody) -> Option<String> {
    match body {
        UpstreamBody::Json(Value::Object(map)) => match map.get("error") {
            None | Some(Value::Null) => None,
            Some(value) => Some(error_message(value)),
        },
        _ => None,
    }
}

fn error_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
