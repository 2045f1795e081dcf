// Response Interpreter
// Raw HTTP response -> typed value or SunraError

use crate::domain::status::json_to_string;
use crate::domain::{ApiOptions, Output, QueueStatus};
use crate::error::{RateLimitInfo, Result, SunraError};
use crate::port::HttpResponse;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Error `type` used when the server did not classify the failure
pub const NETWORK_ERROR_TYPE: &str = "network_error";

/// Correlation id of the response, if any
pub fn request_id(response: &HttpResponse) -> Option<String> {
    response.header(HEADER_REQUEST_ID).map(str::to_string)
}

fn attach_request_id(err: SunraError, request_id: Option<String>) -> SunraError {
    match request_id {
        Some(id) => err.with_request_id(id),
        None => err,
    }
}

/// Rate limit snapshot; None unless all three headers parse
pub fn extract_rate_limit(response: &HttpResponse) -> Option<RateLimitInfo> {
    let limit = response.header(HEADER_RATELIMIT_LIMIT)?.trim().parse().ok()?;
    let remaining = response
        .header(HEADER_RATELIMIT_REMAINING)?
        .trim()
        .parse()
        .ok()?;
    let reset = response.header(HEADER_RATELIMIT_RESET)?.trim().parse().ok()?;
    Some(RateLimitInfo {
        limit,
        remaining,
        reset,
    })
}

fn is_json(response: &HttpResponse) -> bool {
    response
        .header("content-type")
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

fn non_empty_body(response: &HttpResponse) -> Option<&[u8]> {
    response.body.as_deref().filter(|b| !b.is_empty())
}

/// Build the error for a non-2xx response
///
/// Nested envelope: `{"error": {message, code, type, details}, "timestamp"}`.
/// Legacy envelope: `{detail, code, type, details, timestamp}`.
pub fn error_from_response(response: &HttpResponse) -> SunraError {
    let mut err =
        SunraError::http(response.status).with_rate_limit(extract_rate_limit(response));

    if is_json(response) {
        if let Some(body) = non_empty_body(response) {
            err = apply_error_body(err, response.status, body);
        }
    }

    debug!(
        status = response.status,
        code = ?err.code(),
        "Request failed"
    );

    attach_request_id(err, request_id(response))
}

fn apply_error_body(mut err: SunraError, status: u16, body: &[u8]) -> SunraError {
    let json: Value = match serde_json::from_slice(body) {
        Ok(json) => json,
        Err(_) => {
            return err.with_type(NETWORK_ERROR_TYPE).with_details(json!({
                "raw_response": String::from_utf8_lossy(body),
                "status_code": status,
            }));
        }
    };

    let mut error_type = None;
    let mut details = None;

    if let Some(obj) = json.as_object() {
        let (message_key, fields) = match obj.get("error").and_then(Value::as_object) {
            Some(nested) => ("message", nested),
            None => ("detail", obj),
        };

        if let Some(message) = fields.get(message_key).and_then(json_to_string) {
            err = err.with_message(message);
        }
        if let Some(code) = fields.get("code").and_then(json_to_string) {
            err = err.with_code(code);
        }
        error_type = fields.get("type").and_then(json_to_string);
        details = fields.get("details").filter(|v| !v.is_null()).cloned();

        if let Some(timestamp) = obj.get("timestamp").and_then(json_to_string) {
            err = err.with_timestamp(timestamp);
        }
    }

    let err = match error_type {
        Some(error_type) => err.with_type(error_type),
        None => {
            details = details.or(Some(json));
            err.with_type(NETWORK_ERROR_TYPE)
        }
    };

    match details {
        Some(details) => err.with_details(details),
        None => err,
    }
}

/// Decode a response body into `T`
///
/// # Errors
/// - HTTP error for non-2xx responses
/// - Protocol error for an empty 2xx body or a body that does not match `T`
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    if !response.is_success() {
        return Err(error_from_response(response));
    }

    let request_id = request_id(response);
    let Some(body) = non_empty_body(response) else {
        return Err(attach_request_id(
            SunraError::protocol("Response has empty body"),
            request_id,
        ));
    };

    serde_json::from_slice(body).map_err(|e| attach_request_id(SunraError::from(e), request_id))
}

/// Decode into the output type declared by `options`
pub fn decode_for<A>(_options: &A, response: &HttpResponse) -> Result<A::Output>
where
    A: ApiOptions + ?Sized,
    A::Output: DeserializeOwned,
{
    decode(response)
}

/// Decode a status payload through its `status` discriminant
pub fn decode_status(response: &HttpResponse) -> Result<QueueStatus> {
    let payload: Value = decode(response)?;
    QueueStatus::from_value(payload).map_err(|e| attach_request_id(e, request_id(response)))
}

/// Decode and wrap with the response's request id
///
/// `fallback_request_id` is used when the server omitted `x-request-id`; with
/// neither available the response is rejected since Output always carries one.
pub fn wrap_output<T: DeserializeOwned>(
    response: &HttpResponse,
    fallback_request_id: Option<&str>,
) -> Result<Output<T>> {
    let data = decode(response)?;
    let request_id = request_id(response)
        .or_else(|| fallback_request_id.map(str::to_string))
        .ok_or_else(|| {
            SunraError::protocol(format!("Response is missing {} header", HEADER_REQUEST_ID))
        })?;
    Ok(Output::new(data, request_id))
}

/// [`wrap_output`] into the output type declared by `options`
pub fn wrap_output_for<A>(
    _options: &A,
    response: &HttpResponse,
    fallback_request_id: Option<&str>,
) -> Result<Output<A::Output>>
where
    A: ApiOptions + ?Sized,
    A::Output: DeserializeOwned,
{
    wrap_output(response, fallback_request_id)
}
