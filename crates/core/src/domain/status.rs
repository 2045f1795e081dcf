// Queue Status Domain Model
//
// Decoded by reading the `status` discriminant first, then parsing the matching variant.

use crate::error::{Result, SunraError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request ID (server-assigned)
pub type RequestId = String;

/// Status discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    InQueue,
    InProgress,
    Completed,
    Canceled,
}

impl StatusKind {
    /// Map a wire literal to a status kind
    pub fn from_literal(literal: &str) -> Option<Self> {
        match literal {
            "IN_QUEUE" => Some(StatusKind::InQueue),
            "IN_PROGRESS" => Some(StatusKind::InProgress),
            "COMPLETED" => Some(StatusKind::Completed),
            "CANCELED" => Some(StatusKind::Canceled),
            _ => None,
        }
    }

    /// Completed and Canceled end the subscription
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusKind::Completed | StatusKind::Canceled)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::InQueue => write!(f, "IN_QUEUE"),
            StatusKind::InProgress => write!(f, "IN_PROGRESS"),
            StatusKind::Completed => write!(f, "COMPLETED"),
            StatusKind::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// Fields shared by every status variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHandle {
    pub request_id: RequestId,
    #[serde(default)]
    pub status_url: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InQueue {
    #[serde(flatten)]
    pub handle: RequestHandle,
    /// Absent on some stream events; read as the head of the queue
    #[serde(default)]
    pub queue_position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InProgress {
    #[serde(flatten)]
    pub handle: RequestHandle,
    #[serde(default)]
    pub logs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completed {
    #[serde(flatten)]
    pub handle: RequestHandle,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canceled {
    #[serde(flatten)]
    pub handle: RequestHandle,
    #[serde(default)]
    pub logs: Option<String>,
}

/// Structured failure attached to an unsuccessful Completed status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailurePayload {
    pub message: Option<String>,
    pub code: Option<String>,
    pub error_type: Option<String>,
    pub details: Option<serde_json::Value>,
    pub timestamp: Option<String>,
}

impl FailurePayload {
    /// Read the known fields from an error object; anything else is ignored
    pub fn from_value(value: &serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            message: obj.get("message").and_then(json_to_string),
            code: obj.get("code").and_then(json_to_string),
            error_type: obj.get("type").and_then(json_to_string),
            details: obj.get("details").filter(|v| !v.is_null()).cloned(),
            timestamp: obj.get("timestamp").and_then(json_to_string),
        }
    }
}

/// Stringify scalar JSON values (numbers and booleans included)
pub(crate) fn json_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Completed {
    /// Failure payload when `success == false`
    pub fn failure(&self) -> Option<FailurePayload> {
        if self.success {
            return None;
        }
        Some(
            self.error
                .as_ref()
                .map(FailurePayload::from_value)
                .unwrap_or_default(),
        )
    }

    /// Convert an unsuccessful completion into the caller-visible error,
    /// attributed to `request_id`
    pub fn to_error(&self, request_id: &str) -> Option<SunraError> {
        let failure = self.failure()?;
        let mut err = SunraError::business(
            failure
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        );
        if let Some(code) = failure.code {
            err = err.with_code(code);
        }
        if let Some(error_type) = failure.error_type {
            err = err.with_type(error_type);
        }
        if let Some(details) = failure.details {
            err = err.with_details(details);
        }
        if let Some(timestamp) = failure.timestamp {
            err = err.with_timestamp(timestamp);
        }
        Some(err.with_request_id(request_id))
    }
}

/// Queue status update
#[derive(Debug, Clone, PartialEq)]
pub enum QueueStatus {
    InQueue(InQueue),
    InProgress(InProgress),
    Completed(Completed),
    Canceled(Canceled),
}

impl QueueStatus {
    /// Read the `status` discriminant of a raw payload
    ///
    /// Unknown or missing literals are a protocol violation and fail fast.
    pub fn resolve_type(payload: &serde_json::Value) -> Result<StatusKind> {
        let literal = payload
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SunraError::protocol("Status payload has no status field"))?;

        StatusKind::from_literal(literal)
            .ok_or_else(|| SunraError::protocol(format!("Unknown status: {}", literal)))
    }

    /// Decode a raw payload into the matching variant
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        let status = match Self::resolve_type(&payload)? {
            StatusKind::InQueue => QueueStatus::InQueue(serde_json::from_value(payload)?),
            StatusKind::InProgress => QueueStatus::InProgress(serde_json::from_value(payload)?),
            StatusKind::Completed => QueueStatus::Completed(serde_json::from_value(payload)?),
            StatusKind::Canceled => QueueStatus::Canceled(serde_json::from_value(payload)?),
        };
        Ok(status)
    }

    /// Decode an SSE data frame
    pub fn from_json_str(data: &str) -> Result<Self> {
        let payload: serde_json::Value = serde_json::from_str(data)?;
        Self::from_value(payload)
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            QueueStatus::InQueue(_) => StatusKind::InQueue,
            QueueStatus::InProgress(_) => StatusKind::InProgress,
            QueueStatus::Completed(_) => StatusKind::Completed,
            QueueStatus::Canceled(_) => StatusKind::Canceled,
        }
    }

    pub fn handle(&self) -> &RequestHandle {
        match self {
            QueueStatus::InQueue(s) => &s.handle,
            QueueStatus::InProgress(s) => &s.handle,
            QueueStatus::Completed(s) => &s.handle,
            QueueStatus::Canceled(s) => &s.handle,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.handle().request_id
    }

    pub fn logs(&self) -> Option<&str> {
        match self {
            QueueStatus::InQueue(_) => None,
            QueueStatus::InProgress(s) => s.logs.as_deref(),
            QueueStatus::Completed(s) => s.logs.as_deref(),
            QueueStatus::Canceled(s) => s.logs.as_deref(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (request_id={}", self.kind(), self.request_id())?;
        match self {
            QueueStatus::InQueue(s) => write!(f, ", queue_position={})", s.queue_position),
            QueueStatus::Completed(s) => write!(f, ", success={})", s.success),
            _ => write!(f, ")"),
        }
    }
}
