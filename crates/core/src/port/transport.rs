// HTTP Transport Port (ADR-001)
// Abstraction over the HTTP client: one-shot requests and server-sent event streams

use crate::domain::HttpMethod;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Transport-ready request description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including the query string
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body (never set for GET)
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// All header values matching `name` (case-insensitive)
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response as seen by the response interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// None when the server sent no body
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// JSON response with the matching content type
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(value.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// One server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            id: None,
            data: data.into(),
        }
    }
}

/// Live event stream; ends when the server closes the connection.
/// An `Err` item is a transport failure (reset, network drop).
pub type EventStream = BoxStream<'static, Result<SseEvent>>;

/// Outcome of opening an event stream
pub enum StreamHandshake {
    /// 2xx: events follow
    Open(EventStream),
    /// Non-2xx: the full response, for the response interpreter
    Rejected(HttpResponse),
}

/// HTTP Transport trait
///
/// Implementations:
/// - ReqwestTransport: reqwest connection pool (sunra-infra-http)
/// - MockTransport: scripted responses for tests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute a one-shot request
    ///
    /// # Errors
    /// - Transport error if the connection fails; HTTP error statuses are NOT errors here
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Open a server-sent event stream
    ///
    /// # Errors
    /// - Transport error if the connection cannot be established
    async fn open_event_stream(&self, request: HttpRequest) -> Result<StreamHandshake>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::SunraError;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted stream outcome
    pub enum MockStream {
        /// Events are delivered in order, then the stream closes
        Events(Vec<Result<SseEvent>>),
        /// Server rejected the stream request
        Rejected(HttpResponse),
        /// Connection could not be opened
        ConnectFailed(String),
    }

    impl MockStream {
        /// Stream of JSON payloads, one event each
        pub fn json_events(payloads: Vec<serde_json::Value>) -> Self {
            MockStream::Events(
                payloads
                    .into_iter()
                    .map(|p| Ok(SseEvent::data(p.to_string())))
                    .collect(),
            )
        }
    }

    /// Mock Transport with FIFO scripted responses
    #[derive(Clone, Default)]
    pub struct MockTransport {
        responses: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
        streams: Arc<Mutex<VecDeque<MockStream>>>,
        requests: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the response for the next `execute` call
        pub fn push_response(&self, response: HttpResponse) -> &Self {
            self.responses.lock().unwrap().push_back(Ok(response));
            self
        }

        /// Queue a transport failure for the next `execute` call
        pub fn push_failure(&self, message: impl Into<String>) -> &Self {
            let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message.into());
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(SunraError::transport(err)));
            self
        }

        /// Queue the outcome of the next `open_event_stream` call
        pub fn push_stream(&self, stream: MockStream) -> &Self {
            self.streams.lock().unwrap().push_back(stream);
            self
        }

        /// Every request seen so far, in order
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(SunraError::protocol(format!(
                        "MockTransport: no response scripted for {} {}",
                        request.method, request.url
                    )))
                })
        }

        async fn open_event_stream(&self, request: HttpRequest) -> Result<StreamHandshake> {
            self.requests.lock().unwrap().push(request.clone());
            let scripted = self.streams.lock().unwrap().pop_front();
            match scripted {
                Some(MockStream::Events(events)) => {
                    Ok(StreamHandshake::Open(futures::stream::iter(events).boxed()))
                }
                Some(MockStream::Rejected(response)) => Ok(StreamHandshake::Rejected(response)),
                Some(MockStream::ConnectFailed(message)) => {
                    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message);
                    Err(SunraError::transport(err))
                }
                None => Err(SunraError::protocol(format!(
                    "MockTransport: no stream scripted for {}",
                    request.url
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200).with_header("X-Request-Id", "abc");
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert_eq!(response.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_is_success_range() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(204).is_success());
        assert!(!HttpResponse::new(199).is_success());
        assert!(!HttpResponse::new(301).is_success());
        assert!(!HttpResponse::new(429).is_success());
    }
}
