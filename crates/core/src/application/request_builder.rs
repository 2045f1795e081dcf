// Request Builder
// Pure: options + URL + query -> transport-ready request. No I/O.

use crate::domain::{ApiOptions, HttpMethod};
use crate::error::{Result, SunraError};
use crate::port::HttpRequest;

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_EVENT_STREAM: &str = "text/event-stream";

/// Query parameters appended to the URL (values already stringified)
pub type QueryParams = Vec<(&'static str, String)>;

/// Build a JSON request for `options`
///
/// - absent or null input is sent as `{}`
/// - GET requests never carry a body
/// - `content-type` and `accept` are always `application/json`
pub fn build<O>(url: &str, options: &O, query: &QueryParams) -> Result<HttpRequest>
where
    O: ApiOptions + ?Sized,
{
    let method = options.http_method();
    let body = if method == HttpMethod::Get {
        None
    } else {
        Some(serialize_input(options.input())?)
    };

    Ok(HttpRequest {
        method,
        url: with_query(url, query)?,
        headers: vec![
            ("content-type".to_string(), APPLICATION_JSON.to_string()),
            ("accept".to_string(), APPLICATION_JSON.to_string()),
        ],
        body,
    })
}

/// Build the subscription request: same as `build` plus `accept: text/event-stream`
pub fn build_event_stream<O>(url: &str, options: &O, query: &QueryParams) -> Result<HttpRequest>
where
    O: ApiOptions + ?Sized,
{
    let mut request = build(url, options, query)?;
    request
        .headers
        .push(("accept".to_string(), TEXT_EVENT_STREAM.to_string()));
    Ok(request)
}

fn serialize_input(input: Option<&serde_json::Value>) -> Result<String> {
    match input {
        None | Some(serde_json::Value::Null) => Ok("{}".to_string()),
        Some(value) => Ok(serde_json::to_string(value)?),
    }
}

fn with_query(url: &str, query: &QueryParams) -> Result<String> {
    let mut parsed = url::Url::parse(url)
        .map_err(|e| SunraError::validation(format!("Invalid URL {}: {}", url, e)).with_source(e))?;

    if !query.is_empty() {
        let mut pairs = parsed.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueueCancelOptions, QueueStatusOptions, QueueSubmitOptions, RunOptions};
    use serde_json::json;

    const URL: &str = "https://api.sunra.ai/v1/queue/owner/app";

    #[test]
    fn test_empty_input_sends_empty_object() {
        let request = build(URL, &QueueSubmitOptions::default(), &vec![]).unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.as_deref(), Some("{}"));

        let request = build(URL, &RunOptions::with_input(json!(null)), &vec![]).unwrap();
        assert_eq!(request.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_input_roundtrip() {
        for input in [
            json!({}),
            json!({"prompt": "a cat", "seed": 42, "nested": {"list": [1, 2, 3]}}),
        ] {
            let request =
                build(URL, &QueueSubmitOptions::with_input(input.clone()), &vec![]).unwrap();
            let decoded: serde_json::Value =
                serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
            assert_eq!(decoded, input);
        }
    }

    #[test]
    fn test_get_never_has_body() {
        let get_run = RunOptions::with_input(json!({"q": 1})).method(HttpMethod::Get);
        assert_eq!(build(URL, &get_run, &vec![]).unwrap().body, None);

        let status = QueueStatusOptions::new("r1");
        assert_eq!(build(URL, &status, &vec![]).unwrap().body, None);
    }

    #[test]
    fn test_put_without_input_sends_empty_object() {
        let request = build(URL, &QueueCancelOptions::new("r1"), &vec![]).unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_query_params_encoded() {
        let query = vec![("webhook", "https://example.com/hook?a=1&b=2".to_string())];
        let request = build(URL, &QueueSubmitOptions::default(), &query).unwrap();
        let parsed = url::Url::parse(&request.url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![(
                "webhook".to_string(),
                "https://example.com/hook?a=1&b=2".to_string()
            )]
        );
    }

    #[test]
    fn test_no_query_leaves_url_untouched() {
        let request = build(URL, &QueueSubmitOptions::default(), &vec![]).unwrap();
        assert_eq!(request.url, URL);
    }

    #[test]
    fn test_json_headers_always_set() {
        let request = build(URL, &QueueStatusOptions::new("r1"), &vec![]).unwrap();
        assert_eq!(request.header("content-type"), Some(APPLICATION_JSON));
        assert_eq!(request.header("accept"), Some(APPLICATION_JSON));
    }

    #[test]
    fn test_event_stream_accept_header() {
        let query = vec![("logs", "1".to_string())];
        let request = build_event_stream(
            "https://api.sunra.ai/v1/queue/requests/r1/status/stream",
            &crate::domain::QueueSubscribeOptions::new("r1"),
            &query,
        )
        .unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.header_values("accept").any(|v| v == TEXT_EVENT_STREAM));
        assert!(request.url.ends_with("/status/stream?logs=1"));
    }

    #[test]
    fn test_invalid_url_is_validation_error() {
        let err = build("not a url", &QueueSubmitOptions::default(), &vec![]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
