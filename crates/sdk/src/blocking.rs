//! Blocking client
//!
//! Wraps [`SunraClient`] with an owned current-thread runtime; every call
//! `block_on`s the same async chain. Do not call these methods from inside an
//! async context.

use crate::client::SunraClient;
use crate::config::ClientConfig;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use sunra_core::application::QueueClient;
use sunra_core::domain::{
    Completed, InQueue, Output, QueueCancelOptions, QueueResultOptions, QueueStatus,
    QueueStatusOptions, QueueSubmitOptions, QueueSubscribeOptions, RunOptions, SubscribeOptions,
};
use sunra_core::port::HttpTransport;
use sunra_core::{Result, SunraError};
use tokio::runtime::Runtime;
use tracing::warn;

fn build_runtime() -> Result<Arc<Runtime>> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|e| SunraError::transport(e).with_message("Failed to start client runtime"))
}

/// Sunra API Client (blocking)
///
/// Clones share the runtime and the connection pool, and may be used from
/// several threads at once: each call drives the shared runtime while it blocks.
#[derive(Clone)]
pub struct BlockingSunraClient {
    inner: SunraClient,
    runtime: Arc<Runtime>,
}

impl BlockingSunraClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            inner: SunraClient::new(config)?,
            runtime: build_runtime()?,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            inner: SunraClient::with_transport(transport, base_url),
            runtime: build_runtime()?,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The non-blocking client this one drives
    ///
    /// Pooled connections are served by tasks on this client's own runtime, which
    /// only makes progress while a blocking call is running. Awaiting the returned
    /// client from another runtime can therefore stall on a reused connection;
    /// build a [`SunraClient`] there instead.
    pub fn as_async(&self) -> &SunraClient {
        &self.inner
    }

    /// Blocking view of the queue protocol
    pub fn queue(&self) -> BlockingQueueClient {
        BlockingQueueClient {
            queue: self.inner.queue().clone(),
            runtime: self.runtime.clone(),
        }
    }

    /// See [`SunraClient::run`]
    pub fn run<O: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        options: RunOptions<O>,
    ) -> Result<Output<O>> {
        self.block_on(self.inner.run(endpoint_id, options))
    }

    /// See [`SunraClient::subscribe`]; errors are returned, never swallowed
    pub fn subscribe<O: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        options: SubscribeOptions<O>,
    ) -> Result<Output<O>> {
        self.block_on(self.inner.subscribe(endpoint_id, options))
    }

    /// Like [`subscribe`](Self::subscribe), but hands any error to `on_error`
    /// and returns `None` instead.
    ///
    /// Kept for callers that relied on handler-style error reporting; prefer
    /// `subscribe` in new code, since a `None` here carries no reason on its own.
    pub fn subscribe_or_else<O: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        options: SubscribeOptions<O>,
        on_error: impl FnOnce(&SunraError),
    ) -> Option<Output<O>> {
        match self.subscribe(endpoint_id, options) {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(endpoint = endpoint_id, error = %e, "Subscribe failed, handing error to caller");
                on_error(&e);
                None
            }
        }
    }
}

impl std::fmt::Debug for BlockingSunraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingSunraClient")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Blocking queue protocol client
#[derive(Clone)]
pub struct BlockingQueueClient {
    queue: QueueClient,
    runtime: Arc<Runtime>,
}

impl BlockingQueueClient {
    pub fn submit(&self, endpoint_id: &str, options: QueueSubmitOptions) -> Result<InQueue> {
        self.runtime.block_on(self.queue.submit(endpoint_id, options))
    }

    pub fn status(&self, options: QueueStatusOptions) -> Result<QueueStatus> {
        self.runtime.block_on(self.queue.status(options))
    }

    pub fn subscribe_to_status(&self, options: QueueSubscribeOptions) -> Result<Completed> {
        self.runtime.block_on(self.queue.subscribe_to_status(options))
    }

    pub fn poll_until_terminal(
        &self,
        options: QueueSubscribeOptions,
        interval: Duration,
    ) -> Result<Completed> {
        self.runtime
            .block_on(self.queue.poll_until_terminal(options, interval))
    }

    pub fn result<O: DeserializeOwned>(&self, options: QueueResultOptions<O>) -> Result<Output<O>> {
        self.runtime.block_on(self.queue.result(options))
    }

    pub fn cancel(&self, options: QueueCancelOptions) -> Result<serde_json::Value> {
        self.runtime.block_on(self.queue.cancel(options))
    }
}

impl std::fmt::Debug for BlockingQueueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingQueueClient")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
