// Request Options
//
// Closed set of option structs sharing one contract: input payload, HTTP method, result type.

use crate::domain::status::{Completed, InQueue, QueueStatus, RequestId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked for every status update observed while waiting
pub type QueueUpdateCallback = Arc<dyn Fn(&QueueStatus) + Send + Sync>;

/// Interval between status polls when waiting in polling mode
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// How completion is waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// One long-lived server-sent event stream
    #[default]
    Streaming,
    /// Repeated status polls, `interval` apart
    Polling { interval: Duration },
}

impl WaitMode {
    pub fn polling() -> Self {
        WaitMode::Polling {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Shared contract of every request options type
pub trait ApiOptions: sealed::Sealed {
    /// Type the successful response decodes into
    type Output;

    /// Input payload (None means "no input")
    fn input(&self) -> Option<&serde_json::Value>;

    /// HTTP method (POST when the options do not say otherwise)
    fn http_method(&self) -> HttpMethod {
        HttpMethod::Post
    }
}

fn callback_debug(cb: &Option<QueueUpdateCallback>) -> &'static str {
    if cb.is_some() {
        "Some(<callback>)"
    } else {
        "None"
    }
}

// ============================================================================
// Facade options
// ============================================================================

/// One-shot execution against the endpoint's direct path
pub struct RunOptions<O = serde_json::Value> {
    pub input: Option<serde_json::Value>,
    pub method: Option<HttpMethod>,
    result: PhantomData<fn() -> O>,
}

impl RunOptions<serde_json::Value> {
    pub fn new() -> Self {
        Self {
            input: None,
            method: None,
            result: PhantomData,
        }
    }

    pub fn with_input(input: serde_json::Value) -> Self {
        Self::new().input(input)
    }
}

impl Default for RunOptions<serde_json::Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> RunOptions<O> {
    pub fn input(mut self, input: serde_json::Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Decode the response into `T` instead
    pub fn result_type<T>(self) -> RunOptions<T> {
        RunOptions {
            input: self.input,
            method: self.method,
            result: PhantomData,
        }
    }
}

impl<O> fmt::Debug for RunOptions<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("input", &self.input)
            .field("method", &self.method)
            .finish()
    }
}

impl<O> sealed::Sealed for RunOptions<O> {}

impl<O> ApiOptions for RunOptions<O> {
    type Output = O;

    fn input(&self) -> Option<&serde_json::Value> {
        self.input.as_ref()
    }

    fn http_method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }
}

/// Submit, wait for completion, fetch the result
pub struct SubscribeOptions<O = serde_json::Value> {
    pub input: Option<serde_json::Value>,
    pub webhook_url: Option<String>,
    pub logs: bool,
    pub mode: WaitMode,
    pub on_queue_update: Option<QueueUpdateCallback>,
    result: PhantomData<fn() -> O>,
}

impl SubscribeOptions<serde_json::Value> {
    pub fn new() -> Self {
        Self {
            input: None,
            webhook_url: None,
            logs: false,
            mode: WaitMode::Streaming,
            on_queue_update: None,
            result: PhantomData,
        }
    }

    pub fn with_input(input: serde_json::Value) -> Self {
        Self::new().input(input)
    }
}

impl Default for SubscribeOptions<serde_json::Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> SubscribeOptions<O> {
    pub fn input(mut self, input: serde_json::Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn logs(mut self, logs: bool) -> Self {
        self.logs = logs;
        self
    }

    pub fn mode(mut self, mode: WaitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Wait by polling the status every `interval` instead of streaming
    pub fn poll_interval(self, interval: Duration) -> Self {
        self.mode(WaitMode::Polling { interval })
    }

    pub fn on_queue_update(mut self, f: impl Fn(&QueueStatus) + Send + Sync + 'static) -> Self {
        self.on_queue_update = Some(Arc::new(f));
        self
    }

    pub fn result_type<T>(self) -> SubscribeOptions<T> {
        SubscribeOptions {
            input: self.input,
            webhook_url: self.webhook_url,
            logs: self.logs,
            mode: self.mode,
            on_queue_update: self.on_queue_update,
            result: PhantomData,
        }
    }
}

impl<O> fmt::Debug for SubscribeOptions<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("input", &self.input)
            .field("webhook_url", &self.webhook_url)
            .field("logs", &self.logs)
            .field("mode", &self.mode)
            .field("on_queue_update", &callback_debug(&self.on_queue_update))
            .finish()
    }
}

impl<O> sealed::Sealed for SubscribeOptions<O> {}

impl<O> ApiOptions for SubscribeOptions<O> {
    type Output = O;

    fn input(&self) -> Option<&serde_json::Value> {
        self.input.as_ref()
    }
}

// ============================================================================
// Queue options
// ============================================================================

/// Enqueue a request
#[derive(Debug, Clone, Default)]
pub struct QueueSubmitOptions {
    pub input: Option<serde_json::Value>,
    pub webhook_url: Option<String>,
}

impl QueueSubmitOptions {
    pub fn with_input(input: serde_json::Value) -> Self {
        Self {
            input: Some(input),
            webhook_url: None,
        }
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }
}

impl sealed::Sealed for QueueSubmitOptions {}

impl ApiOptions for QueueSubmitOptions {
    type Output = InQueue;

    fn input(&self) -> Option<&serde_json::Value> {
        self.input.as_ref()
    }
}

/// Poll the current status once
#[derive(Debug, Clone)]
pub struct QueueStatusOptions {
    pub request_id: RequestId,
    pub logs: bool,
}

impl QueueStatusOptions {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            logs: false,
        }
    }

    pub fn logs(mut self, logs: bool) -> Self {
        self.logs = logs;
        self
    }
}

impl sealed::Sealed for QueueStatusOptions {}

impl ApiOptions for QueueStatusOptions {
    type Output = QueueStatus;

    fn input(&self) -> Option<&serde_json::Value> {
        None
    }

    fn http_method(&self) -> HttpMethod {
        HttpMethod::Get
    }
}

/// Wait for a terminal status
#[derive(Clone)]
pub struct QueueSubscribeOptions {
    pub request_id: RequestId,
    pub logs: bool,
    pub mode: WaitMode,
    pub on_queue_update: Option<QueueUpdateCallback>,
}

impl QueueSubscribeOptions {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            logs: false,
            mode: WaitMode::Streaming,
            on_queue_update: None,
        }
    }

    pub fn logs(mut self, logs: bool) -> Self {
        self.logs = logs;
        self
    }

    pub fn mode(mut self, mode: WaitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn poll_interval(self, interval: Duration) -> Self {
        self.mode(WaitMode::Polling { interval })
    }

    pub fn on_queue_update(mut self, f: impl Fn(&QueueStatus) + Send + Sync + 'static) -> Self {
        self.on_queue_update = Some(Arc::new(f));
        self
    }

    /// Reuse an already shared callback
    pub fn with_callback(mut self, cb: Option<QueueUpdateCallback>) -> Self {
        self.on_queue_update = cb;
        self
    }
}

impl fmt::Debug for QueueSubscribeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSubscribeOptions")
            .field("request_id", &self.request_id)
            .field("logs", &self.logs)
            .field("mode", &self.mode)
            .field("on_queue_update", &callback_debug(&self.on_queue_update))
            .finish()
    }
}

impl sealed::Sealed for QueueSubscribeOptions {}

impl ApiOptions for QueueSubscribeOptions {
    type Output = Completed;

    fn input(&self) -> Option<&serde_json::Value> {
        None
    }

    fn http_method(&self) -> HttpMethod {
        HttpMethod::Get
    }
}

/// Fetch the final result of a completed request
pub struct QueueResultOptions<O = serde_json::Value> {
    pub request_id: RequestId,
    result: PhantomData<fn() -> O>,
}

impl QueueResultOptions<serde_json::Value> {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            result: PhantomData,
        }
    }
}

impl<O> QueueResultOptions<O> {
    pub fn result_type<T>(self) -> QueueResultOptions<T> {
        QueueResultOptions {
            request_id: self.request_id,
            result: PhantomData,
        }
    }
}

impl<O> fmt::Debug for QueueResultOptions<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueResultOptions")
            .field("request_id", &self.request_id)
            .finish()
    }
}

impl<O> sealed::Sealed for QueueResultOptions<O> {}

impl<O> ApiOptions for QueueResultOptions<O> {
    type Output = O;

    fn input(&self) -> Option<&serde_json::Value> {
        None
    }

    fn http_method(&self) -> HttpMethod {
        HttpMethod::Get
    }
}

/// Ask the server to cancel a request
#[derive(Debug, Clone)]
pub struct QueueCancelOptions {
    pub request_id: RequestId,
}

impl QueueCancelOptions {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

impl sealed::Sealed for QueueCancelOptions {}

impl ApiOptions for QueueCancelOptions {
    type Output = serde_json::Value;

    fn input(&self) -> Option<&serde_json::Value> {
        None
    }

    fn http_method(&self) -> HttpMethod {
        HttpMethod::Put
    }
}
