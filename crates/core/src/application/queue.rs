// Queue Status Protocol
//
// submit -> status | subscribe_to_status -> result, plus cancel.
// Everything after submit is addressed by request id alone.
// Waiting runs over the status stream or, in polling mode, over repeated status calls.

use super::request_builder::{self, QueryParams};
use super::response;
use super::routes::ApiRoutes;
use crate::domain::{
    Completed, EndpointId, InQueue, Output, QueueCancelOptions, QueueResultOptions, QueueStatus,
    QueueStatusOptions, QueueSubmitOptions, QueueSubscribeOptions, WaitMode,
};
use crate::error::{Result, SunraError};
use crate::port::{HttpTransport, SseEvent, StreamHandshake};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Error code reported when a request is canceled while subscribed
pub const CANCELED_CODE: &str = "CANCELED";

/// Decoded status events of one subscription
pub type StatusStream = BoxStream<'static, Result<QueueStatus>>;

/// Queue protocol client
///
/// Cheap to clone: the transport is shared.
#[derive(Clone)]
pub struct QueueClient {
    transport: Arc<dyn HttpTransport>,
    routes: ApiRoutes,
}

impl QueueClient {
    pub fn new(transport: Arc<dyn HttpTransport>, routes: ApiRoutes) -> Self {
        Self { transport, routes }
    }

    pub fn routes(&self) -> &ApiRoutes {
        &self.routes
    }

    /// Enqueue a request for `endpoint_id`
    ///
    /// # Errors
    /// - Validation error if `endpoint_id` is malformed
    /// - HTTP/transport/protocol error from the submit call
    pub async fn submit(&self, endpoint_id: &str, options: QueueSubmitOptions) -> Result<InQueue> {
        let endpoint = EndpointId::parse(endpoint_id)?;
        let mut query = QueryParams::new();
        if let Some(webhook) = &options.webhook_url {
            query.push(("webhook", webhook.clone()));
        }

        let request = request_builder::build(&self.routes.submit(&endpoint), &options, &query)?;
        let response = self.transport.execute(request).await?;
        let in_queue: InQueue = response::decode_for(&options, &response)?;

        info!(
            endpoint = %endpoint,
            request_id = %in_queue.handle.request_id,
            queue_position = in_queue.queue_position,
            "Request submitted"
        );

        Ok(in_queue)
    }

    /// Poll the current status once
    ///
    /// An unsuccessful Completed is returned as-is, never raised.
    pub async fn status(&self, options: QueueStatusOptions) -> Result<QueueStatus> {
        let request = request_builder::build(
            &self.routes.status(&options.request_id),
            &options,
            &logs_query(options.logs),
        )?;
        let response = self.transport.execute(request).await?;
        let status = response::decode_status(&response)?;

        debug!(request_id = %options.request_id, status = %status.kind(), "Status polled");
        Ok(status)
    }

    /// Open the status stream and decode its events
    ///
    /// Keep-alive frames (blank data) are dropped. Errors carry the request id.
    /// The stream ends when the server closes the connection; it does not stop
    /// at a terminal status on its own.
    pub async fn status_events(&self, options: &QueueSubscribeOptions) -> Result<StatusStream> {
        let request_id = options.request_id.clone();
        let request = request_builder::build_event_stream(
            &self.routes.status_stream(&request_id),
            options,
            &logs_query(options.logs),
        )?;

        let events = match self.transport.open_event_stream(request).await {
            Ok(StreamHandshake::Open(events)) => events,
            Ok(StreamHandshake::Rejected(rejected)) => {
                return Err(response::error_from_response(&rejected).with_request_id(request_id));
            }
            Err(e) => return Err(e.with_request_id(request_id)),
        };

        debug!(request_id = %request_id, "Status stream opened");

        let statuses = events.filter_map(move |item| {
            future::ready(decode_event(item).map(|r| r.map_err(|e| e.with_request_id(&request_id))))
        });
        Ok(statuses.boxed())
    }

    /// Wait for a terminal status, over the stream or by polling per `options.mode`
    ///
    /// The callback sees every observed status in server order, terminal one included.
    ///
    /// # Errors
    /// - Business error for `Completed{success=false}` (built from the nested error payload)
    /// - Business error with code `CANCELED` when the request is canceled
    /// - Protocol error when the stream closes before a terminal status
    /// - Transport error if the connection drops; no reconnect is attempted
    pub async fn subscribe_to_status(&self, options: QueueSubscribeOptions) -> Result<Completed> {
        match options.mode {
            WaitMode::Streaming => self.stream_until_terminal(options).await,
            WaitMode::Polling { interval } => self.poll_until_terminal(options, interval).await,
        }
    }

    async fn stream_until_terminal(&self, options: QueueSubscribeOptions) -> Result<Completed> {
        let request_id = options.request_id.clone();
        let callback = options.on_queue_update.clone();
        let mut statuses = self.status_events(&options).await?;
        let mut last: Option<QueueStatus> = None;

        while let Some(item) = statuses.next().await {
            let status = item?;
            if let Some(cb) = &callback {
                cb(&status);
            }

            match settle(status, &request_id) {
                Ok(completed) => return completed,
                Err(pending) => {
                    debug!(request_id = %request_id, status = %pending.kind(), "Status update");
                    last = Some(pending);
                }
            }
        }

        let state = last
            .map(|s| s.to_string())
            .unwrap_or_else(|| "no status received".to_string());
        warn!(request_id = %request_id, state = %state, "Status stream closed early");

        Err(
            SunraError::protocol(format!("Streaming closed with invalid state: {}", state))
                .with_request_id(request_id),
        )
    }

    /// Poll the status every `interval` until it is terminal
    ///
    /// `options.mode` is ignored. Same callback and terminal handling as the
    /// streaming wait; the first failed poll ends the wait.
    pub async fn poll_until_terminal(
        &self,
        options: QueueSubscribeOptions,
        interval: Duration,
    ) -> Result<Completed> {
        let request_id = options.request_id.clone();
        let poll = QueueStatusOptions::new(request_id.as_str()).logs(options.logs);

        loop {
            let status = self
                .status(poll.clone())
                .await
                .map_err(|e| e.with_request_id(&request_id))?;
            if let Some(cb) = &options.on_queue_update {
                cb(&status);
            }

            match settle(status, &request_id) {
                Ok(completed) => return completed,
                Err(pending) => {
                    debug!(request_id = %request_id, status = %pending.kind(), "Polled, waiting");
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    /// Fetch the final payload of a completed request
    pub async fn result<O: DeserializeOwned>(
        &self,
        options: QueueResultOptions<O>,
    ) -> Result<Output<O>> {
        let request = request_builder::build(
            &self.routes.result(&options.request_id),
            &options,
            &QueryParams::new(),
        )?;
        let response = self.transport.execute(request).await?;
        response::wrap_output_for(&options, &response, Some(&options.request_id))
    }

    /// Ask the server to cancel; returns the server's raw answer
    pub async fn cancel(&self, options: QueueCancelOptions) -> Result<serde_json::Value> {
        let request = request_builder::build(
            &self.routes.cancel(&options.request_id),
            &options,
            &QueryParams::new(),
        )?;
        let response = self.transport.execute(request).await?;
        let body = response::decode_for(&options, &response)?;

        info!(request_id = %options.request_id, "Cancel requested");
        Ok(body)
    }
}

impl std::fmt::Debug for QueueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueClient")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

fn logs_query(logs: bool) -> QueryParams {
    if logs {
        vec![("logs", "1".to_string())]
    } else {
        QueryParams::new()
    }
}

/// Outcome of a terminal status, or the status back when it is not terminal
fn settle(
    status: QueueStatus,
    request_id: &str,
) -> std::result::Result<Result<Completed>, QueueStatus> {
    match status {
        QueueStatus::Completed(completed) => {
            if let Some(err) = completed.to_error(request_id) {
                warn!(request_id = %request_id, error = %err, "Request failed");
                return Ok(Err(err));
            }
            info!(request_id = %request_id, "Request completed");
            Ok(Ok(completed))
        }
        QueueStatus::Canceled(_) => {
            warn!(request_id = %request_id, "Request canceled while subscribed");
            Ok(Err(SunraError::business("Request was canceled before completion")
                .with_code(CANCELED_CODE)
                .with_request_id(request_id)))
        }
        pending => Err(pending),
    }
}

/// None for keep-alives
fn decode_event(item: Result<SseEvent>) -> Option<Result<QueueStatus>> {
    match item {
        Err(e) => Some(Err(e)),
        Ok(event) if event.data.trim().is_empty() => None,
        Ok(event) => Some(QueueStatus::from_json_str(&event.data)),
    }
}
