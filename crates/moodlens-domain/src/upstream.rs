//! Raw responses received from upstream providers

use serde_json::Value;

/// Body of an upstream response, parsed as JSON when it parses
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// Body parsed as JSON
    Json(Value),
    /// Body that was not valid JSON, kept as text
    Text(String),
}

impl UpstreamBody {
    /// Parse raw bytes, falling back to (lossy UTF-8) text
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => UpstreamBody::Json(value),
            Err(_) => UpstreamBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The body as text: JSON strings unwrapped, other JSON re-serialized
    pub fn text(&self) -> String {
        match self {
            UpstreamBody::Json(Value::String(s)) => s.clone(),
            UpstreamBody::Json(value) => value.to_string(),
            UpstreamBody::Text(s) => s.clone(),
        }
    }
}

/// Untouched output of a single upstream call
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpstreamResponse {
    /// HTTP status code returned by the provider
    pub status_code: u16,
    /// Response body
    pub body: UpstreamBody,
    /// Body text exactly as received, when read off the wire
    pub raw_text: Option<String>,
}

impl RawUpstreamResponse {
    /// Create a response from a status code and body
    pub fn new(status_code: u16, body: UpstreamBody) -> Self {
        Self {
            status_code,
            body,
            raw_text: None,
        }
    }

    /// Create a response with a JSON body
    pub fn json(status_code: u16, body: Value) -> Self {
        Self::new(status_code, UpstreamBody::Json(body))
    }

    /// Create a response with a plain-text body
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self::new(status_code, UpstreamBody::Text(body.into()))
    }

    /// Create a response from raw bytes as read off the wire
    pub fn from_bytes(status_code: u16, bytes: &[u8]) -> Self {
        Self {
            status_code,
            body: UpstreamBody::from_bytes(bytes),
            raw_text: Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The body as the provider sent it
    ///
    /// A JSON string body is unwrapped. Any other body uses the received
    /// text, falling back to `UpstreamBody::text` when none was kept.
    pub fn body_text(&self) -> String {
        match (&self.body, &self.raw_text) {
            (UpstreamBody::Json(Value::String(s)), _) => s.clone(),
            (_, Some(text)) => text.clone(),
            (body, None) => body.text(),
        }
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Whether the body parsed as JSON
    pub fn is_json(&self) -> bool {
        matches!(self.body, UpstreamBody::Json(_))
    }
}
