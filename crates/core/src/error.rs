// Central Error Type for the Client
//
// Every caller-visible failure (transport, HTTP, protocol, business) is a SunraError.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying cause (transport failures, decode errors)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failure, timeout, stream reset
    Transport,
    /// Non-2xx response decoded from the error envelope
    Http { status: u16 },
    /// Locally detected contract violation by the server
    Protocol,
    /// Terminal status reported as failed (or canceled) by the server
    Business,
    /// Invalid caller input (endpoint id, URL)
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "TRANSPORT"),
            ErrorKind::Http { status } => write!(f, "HTTP_{}", status),
            ErrorKind::Protocol => write!(f, "PROTOCOL"),
            ErrorKind::Business => write!(f, "BUSINESS"),
            ErrorKind::Validation => write!(f, "VALIDATION"),
        }
    }
}

/// Rate limit snapshot taken from `x-ratelimit-*` response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch seconds when the window resets
    pub reset: u64,
}

impl RateLimitInfo {
    /// Reset time as a UTC timestamp (None if out of range)
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.reset)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Client error
///
/// Renders as a single diagnostic line:
/// `<message> | Code: .. | Type: .. | Details: .. | Timestamp: .. | Request ID: ..`
#[derive(Debug, Error)]
#[error(
    "{message}{}",
    diagnostic_suffix(.code, .error_type, .details, .timestamp, .request_id)
)]
pub struct SunraError {
    kind: ErrorKind,
    message: String,
    code: Option<String>,
    error_type: Option<String>,
    details: Option<serde_json::Value>,
    timestamp: Option<String>,
    request_id: Option<String>,
    rate_limit: Option<RateLimitInfo>,
    #[source]
    source: Option<BoxError>,
}

fn diagnostic_suffix(
    code: &Option<String>,
    error_type: &Option<String>,
    details: &Option<serde_json::Value>,
    timestamp: &Option<String>,
    request_id: &Option<String>,
) -> String {
    let mut out = String::new();
    if let Some(code) = code {
        out.push_str(" | Code: ");
        out.push_str(code);
    }
    if let Some(error_type) = error_type {
        out.push_str(" | Type: ");
        out.push_str(error_type);
    }
    if let Some(details) = details {
        out.push_str(" | Details: ");
        match details {
            serde_json::Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
    }
    if let Some(timestamp) = timestamp {
        out.push_str(" | Timestamp: ");
        out.push_str(timestamp);
    }
    if let Some(request_id) = request_id {
        out.push_str(" | Request ID: ");
        out.push_str(request_id);
    }
    out
}

impl SunraError {
    /// Create a bare error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            error_type: None,
            details: None,
            timestamp: None,
            request_id: None,
            rate_limit: None,
            source: None,
        }
    }

    /// Transport failure wrapping the underlying cause
    pub fn transport(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        let mut err = Self::new(ErrorKind::Transport, source.to_string());
        err.source = Some(source);
        err
    }

    /// Locally detected protocol violation
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Invalid caller input
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Server-reported failure of a finished request
    pub fn business(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Business, message)
    }

    /// Non-2xx response with the default message and code
    pub fn http(status: u16) -> Self {
        Self::new(
            ErrorKind::Http { status },
            format!("Request failed with code: {}", status),
        )
        .with_code(status.to_string())
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Attach a request id (keeps the existing one if already set)
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        if self.request_id.is_none() {
            self.request_id = Some(request_id.into());
        }
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn rate_limit(&self) -> Option<RateLimitInfo> {
        self.rate_limit
    }

    /// HTTP status code for errors decoded from a response
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Http { status } => Some(status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    /// Render in the API's own error envelope shape
    pub fn to_json(&self) -> serde_json::Value {
        let mut error = serde_json::Map::new();
        error.insert(
            "code".to_string(),
            self.code
                .clone()
                .unwrap_or_else(|| "UNKNOWN_ERROR".to_string())
                .into(),
        );
        error.insert("message".to_string(), self.message.clone().into());
        if let Some(error_type) = &self.error_type {
            error.insert("type".to_string(), error_type.clone().into());
        }
        if let Some(details) = &self.details {
            error.insert("details".to_string(), details.clone());
        }

        let mut root = serde_json::Map::new();
        root.insert("error".to_string(), serde_json::Value::Object(error));
        if let Some(timestamp) = &self.timestamp {
            root.insert("timestamp".to_string(), timestamp.clone().into());
        }
        if let Some(request_id) = &self.request_id {
            root.insert("request_id".to_string(), request_id.clone().into());
        }
        if let Some(rate_limit) = &self.rate_limit {
            root.insert(
                "rate_limit".to_string(),
                serde_json::to_value(rate_limit).unwrap_or_default(),
            );
        }
        serde_json::Value::Object(root)
    }
}

impl From<serde_json::Error> for SunraError {
    fn from(err: serde_json::Error) -> Self {
        SunraError::protocol(format!("Serialization error: {}", err)).with_source(err)
    }
}

/// Result type alias using SunraError
pub type Result<T> = std::result::Result<T, SunraError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_message_only() {
        let err = SunraError::protocol("Response has empty body");
        assert_eq!(err.to_string(), "Response has empty body");
    }

    #[test]
    fn test_display_appends_present_parts() {
        let err = SunraError::http(422)
            .with_message("seed must be >= 0")
            .with_code("VALIDATION_ERROR")
            .with_type("invalid_request")
            .with_details(json!({"field": "seed"}))
            .with_timestamp("2025-01-01T00:00:00Z")
            .with_request_id("r1");

        assert_eq!(
            err.to_string(),
            "seed must be >= 0 | Code: VALIDATION_ERROR | Type: invalid_request | \
             Details: {\"field\":\"seed\"} | Timestamp: 2025-01-01T00:00:00Z | Request ID: r1"
        );
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_with_request_id_keeps_first() {
        let err = SunraError::protocol("x")
            .with_request_id("first")
            .with_request_id("second");
        assert_eq!(err.request_id(), Some("first"));
    }

    #[test]
    fn test_http_defaults() {
        let err = SunraError::http(500);
        assert_eq!(err.message(), "Request failed with code: 500");
        assert_eq!(err.code(), Some("500"));
        assert_eq!(err.kind(), ErrorKind::Http { status: 500 });
    }

    #[test]
    fn test_transport_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = SunraError::transport(io);
        assert!(err.is_transport());
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.message(), "reset by peer");
    }

    #[test]
    fn test_to_json_envelope() {
        let err = SunraError::business("boom")
            .with_code("E1")
            .with_request_id("r9");
        let value = err.to_json();
        assert_eq!(value["error"]["code"], "E1");
        assert_eq!(value["error"]["message"], "boom");
        assert_eq!(value["request_id"], "r9");
    }

    #[test]
    fn test_rate_limit_reset_at() {
        let info = RateLimitInfo {
            limit: 10,
            remaining: 0,
            reset: 1_234_567_890,
        };
        assert_eq!(info.reset_at().map(|t| t.timestamp()), Some(1_234_567_890));
    }
}
