//! Sunra Client Implementation

use crate::config::ClientConfig;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use sunra_core::application::{request_builder, response, ApiRoutes, QueueClient};
use sunra_core::domain::{
    EndpointId, Output, QueueResultOptions, QueueSubmitOptions, QueueSubscribeOptions, RunOptions,
    SubscribeOptions,
};
use sunra_core::port::HttpTransport;
use sunra_core::Result;
use sunra_infra_http::ReqwestTransport;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Sunra API Client (non-blocking)
///
/// Cheap to clone; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use sunra_sdk::{SubscribeOptions, SunraClient};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SunraClient::from_env()?;
///
/// let output = client
///     .subscribe(
///         "black-forest-labs/flux-kontext-pro/text-to-image",
///         SubscribeOptions::with_input(json!({"prompt": "a lighthouse at dusk"}))
///             .logs(true)
///             .on_queue_update(|status| println!("{}", status)),
///     )
///     .await?;
///
/// println!("{} -> {}", output.request_id, output.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SunraClient {
    transport: Arc<dyn HttpTransport>,
    routes: ApiRoutes,
    queue: QueueClient,
}

impl SunraClient {
    /// Create a client backed by the reqwest transport
    ///
    /// # Errors
    /// - Transport error if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.transport_config())?;
        Ok(Self::with_transport(Arc::new(transport), config.base_url))
    }

    /// Create a client from `SUNRA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Create a client over any transport (tests, custom HTTP stacks)
    pub fn with_transport(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let routes = ApiRoutes::new(base_url);
        let queue = QueueClient::new(transport.clone(), routes.clone());
        Self {
            transport,
            routes,
            queue,
        }
    }

    /// Direct access to the queue protocol
    pub fn queue(&self) -> &QueueClient {
        &self.queue
    }

    /// Execute the endpoint directly, without the queue
    ///
    /// # Errors
    /// - Validation error for a malformed endpoint id
    /// - Protocol error if the response has no `x-request-id` header
    /// - HTTP/transport errors from the call
    pub async fn run<O: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        options: RunOptions<O>,
    ) -> Result<Output<O>> {
        let endpoint = EndpointId::parse(endpoint_id)?;
        let request = request_builder::build(&self.routes.run(&endpoint), &options, &Vec::new())?;
        let response = self.transport.execute(request).await?;
        let output = response::wrap_output_for(&options, &response, None)?;

        info!(endpoint = %endpoint, request_id = %output.request_id, "Run completed");
        Ok(output)
    }

    /// Submit, wait for completion, fetch the result
    ///
    /// Waits over the status stream unless `options.mode` asks for polling.
    /// The callback in `options` sees every observed status, terminal one included.
    /// The returned output carries the request id assigned at submit.
    ///
    /// # Errors
    /// - Business error if the request completes unsuccessfully or is canceled
    /// - Any error of the submit, stream or result steps; nothing is retried
    pub async fn subscribe<O: DeserializeOwned>(
        &self,
        endpoint_id: &str,
        options: SubscribeOptions<O>,
    ) -> Result<Output<O>> {
        let SubscribeOptions {
            input,
            webhook_url,
            logs,
            mode,
            on_queue_update,
            ..
        } = options;

        let in_queue = self
            .queue
            .submit(endpoint_id, QueueSubmitOptions { input, webhook_url })
            .await?;
        let request_id = in_queue.handle.request_id;
        info!(endpoint = endpoint_id, request_id = %request_id, "Submitted");

        let subscribed = QueueSubscribeOptions::new(request_id.as_str())
            .logs(logs)
            .mode(mode)
            .with_callback(on_queue_update);
        if let Err(e) = self.queue.subscribe_to_status(subscribed).await {
            warn!(request_id = %request_id, error = %e, "Subscription failed");
            return Err(e);
        }

        let output = self
            .queue
            .result(QueueResultOptions::new(request_id.as_str()).result_type::<O>())
            .await?;
        info!(request_id = %request_id, "Completed");

        Ok(Output::new(output.data, request_id))
    }

    /// Run [`subscribe`](Self::subscribe) as a tokio task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_subscribe<O>(
        &self,
        endpoint_id: impl Into<String>,
        options: SubscribeOptions<O>,
    ) -> JoinHandle<Result<Output<O>>>
    where
        O: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let endpoint_id = endpoint_id.into();
        tokio::spawn(async move { client.subscribe(&endpoint_id, options).await })
    }
}

impl std::fmt::Debug for SunraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SunraClient")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use sunra_core::domain::HttpMethod;
    use sunra_core::port::transport::mocks::{MockStream, MockTransport};
    use sunra_core::port::HttpResponse;
    use sunra_core::ErrorKind;

    const BASE: &str = "https://api.sunra.ai/v1";

    fn client(transport: &MockTransport) -> SunraClient {
        SunraClient::with_transport(Arc::new(transport.clone()), BASE)
    }

    fn script_happy_path(transport: &MockTransport, result_header: Option<&str>) {
        transport.push_response(HttpResponse::json(
            200,
            &json!({"status": "IN_QUEUE", "request_id": "r1", "queue_position": 3}),
        ));
        transport.push_stream(MockStream::json_events(vec![
            json!({"status": "IN_PROGRESS", "request_id": "r1"}),
            json!({"status": "COMPLETED", "request_id": "r1", "success": true}),
        ]));
        let mut result = HttpResponse::json(200, &json!({"images": [{"url": "https://cdn/x.png"}]}));
        if let Some(id) = result_header {
            result = result.with_header("x-request-id", id);
        }
        transport.push_response(result);
    }

    #[tokio::test]
    async fn test_subscribe_happy_path() -> anyhow::Result<()> {
        let transport = MockTransport::new();
        script_happy_path(&transport, Some("r1"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let output = client(&transport)
            .subscribe(
                "owner/app/text-to-image",
                SubscribeOptions::with_input(json!({"prompt": "cat"}))
                    .on_queue_update(move |s| sink.lock().unwrap().push(s.kind().to_string())),
            )
            .await?;

        assert_eq!(output.request_id, "r1");
        assert_eq!(output.data["images"][0]["url"], "https://cdn/x.png");
        assert_eq!(*seen.lock().unwrap(), vec!["IN_PROGRESS", "COMPLETED"]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert!(requests[1].url.ends_with("/queue/requests/r1/status/stream"));
        assert!(requests[2].url.ends_with("/queue/requests/r1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_keeps_submit_request_id() -> anyhow::Result<()> {
        let transport = MockTransport::new();
        script_happy_path(&transport, None);

        let output = client(&transport)
            .subscribe("owner/app", SubscribeOptions::new())
            .await?;
        assert_eq!(output.request_id, "r1");
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_typed_result() -> anyhow::Result<()> {
        #[derive(serde::Deserialize)]
        struct Image {
            url: String,
        }
        #[derive(serde::Deserialize)]
        struct Images {
            images: Vec<Image>,
        }

        let transport = MockTransport::new();
        script_happy_path(&transport, Some("r1"));

        let output = client(&transport)
            .subscribe("owner/app", SubscribeOptions::new().result_type::<Images>())
            .await?;
        assert_eq!(output.data.images[0].url, "https://cdn/x.png");
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_failed_completion_skips_result() {
        let transport = MockTransport::new();
        transport.push_response(HttpResponse::json(
            200,
            &json!({"status": "IN_QUEUE", "request_id": "r1", "queue_position": 0}),
        ));
        transport.push_stream(MockStream::json_events(vec![json!({
            "status": "COMPLETED", "request_id": "r1", "success": false,
            "error": {"message": "seed must be >= 0", "code": "VALIDATION_ERROR"}
        })]));

        let err = client(&transport)
            .subscribe("owner/app", SubscribeOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.request_id(), Some("r1"));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_spawn_subscribe() -> anyhow::Result<()> {
        let transport = MockTransport::new();
        script_happy_path(&transport, Some("r1"));

        let handle = client(&transport).spawn_subscribe("owner/app", SubscribeOptions::new());
        let output = handle.await??;
        assert_eq!(output.request_id, "r1");
        Ok(())
    }

    #[tokio::test]
    async fn test_run_direct_path() -> anyhow::Result<()> {
        let transport = MockTransport::new();
        transport.push_response(
            HttpResponse::json(200, &json!({"text": "hello"})).with_header("x-request-id", "run-1"),
        );

        let output = client(&transport)
            .run("owner/app/chat", RunOptions::with_input(json!({"q": "hi"})))
            .await?;
        assert_eq!(output.request_id, "run-1");
        assert_eq!(output.data, json!({"text": "hello"}));

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://api.sunra.ai/v1/owner/app/chat");
        assert_eq!(request.body.as_deref(), Some(r#"{"q":"hi"}"#));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_requires_request_id_header() {
        let transport = MockTransport::new();
        transport.push_response(HttpResponse::json(200, &json!({"text": "hello"})));

        let err = tokio_test::assert_err!(
            client(&transport)
                .run("owner/app", RunOptions::new())
                .await
        );
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_run_get_sends_no_body() -> anyhow::Result<()> {
        let transport = MockTransport::new();
        transport.push_response(
            HttpResponse::json(200, &json!([])).with_header("x-request-id", "run-2"),
        );

        client(&transport)
            .run(
                "owner/app/list",
                RunOptions::with_input(json!({"ignored": true})).method(HttpMethod::Get),
            )
            .await?;
        assert_eq!(transport.requests()[0].body, None);
        Ok(())
    }
}
