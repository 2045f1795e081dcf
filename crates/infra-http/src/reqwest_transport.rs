// Reqwest transport (ADR-001: adapter for the HttpTransport port)
// One pooled client shared by one-shot requests and event streams

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sunra_core::domain::HttpMethod;
use sunra_core::port::{
    CredentialsResolver, EnvCredentials, HttpRequest, HttpResponse, HttpTransport,
    StreamHandshake,
};
use sunra_core::{Result, SunraError};

use crate::sse::decode_stream;

/// Header carrying the real target when requests go through a proxy
pub const TARGET_URL_HEADER: &str = "x-sunra-target-url";

/// Default one-shot request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `sunra-client/<version> (rust)`
pub fn default_user_agent() -> String {
    format!("sunra-client/{} (rust)", sunra_core::VERSION)
}

/// Transport settings
#[derive(Clone)]
pub struct HttpTransportConfig {
    pub credentials: Arc<dyn CredentialsResolver>,
    /// Route every request through this URL (target in `x-sunra-target-url`)
    pub proxy_url: Option<String>,
    /// Whole-request timeout for one-shot calls; never applied to event streams
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            credentials: Arc::new(EnvCredentials::default()),
            proxy_url: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            user_agent: default_user_agent(),
        }
    }
}

impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("proxy_url", &self.proxy_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// HttpTransport backed by a reqwest connection pool
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl ReqwestTransport {
    /// Build the connection pool
    ///
    /// # Errors
    /// - Transport error if the TLS backend cannot be initialized
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build().map_err(SunraError::transport)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Resolve where the request is actually sent
    ///
    /// Returns (url to hit, original target when proxied)
    fn route<'a>(&'a self, url: &'a str) -> (&'a str, Option<&'a str>) {
        match self.config.proxy_url.as_deref() {
            Some(proxy) if !url.starts_with(proxy) => (proxy, Some(url)),
            _ => (url, None),
        }
    }

    fn prepare(&self, request: HttpRequest, timeout: Option<Duration>) -> reqwest::RequestBuilder {
        let (url, target) = self.route(&request.url);
        let mut builder = self.client.request(to_reqwest_method(request.method), url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(target) = target {
            builder = builder.header(TARGET_URL_HEADER, target);
        }
        if let Some(key) = self.config.credentials.resolve() {
            builder = builder.header("authorization", format!("Key {}", key));
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}

/// Read the full response into the port's representation
async fn into_http_response(response: reqwest::Response) -> Result<HttpResponse> {
    let status = response.status().as_u16();
    let headers = collect_headers(response.headers());
    let body = response.bytes().await.map_err(SunraError::transport)?;

    Ok(HttpResponse {
        status,
        headers,
        body: if body.is_empty() {
            None
        } else {
            Some(body.to_vec())
        },
    })
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();
        let builder = self.prepare(request, self.config.request_timeout);

        let response = builder.send().await.map_err(SunraError::transport)?;
        let response = into_http_response(response).await?;

        debug!(method = %method, url = %url, status = response.status, "HTTP request");
        Ok(response)
    }

    async fn open_event_stream(&self, request: HttpRequest) -> Result<StreamHandshake> {
        let url = request.url.clone();
        let builder = self.prepare(request, None);

        let response = builder.send().await.map_err(SunraError::transport)?;
        if !response.status().is_success() {
            let rejected = into_http_response(response).await?;
            debug!(url = %url, status = rejected.status, "Event stream rejected");
            return Ok(StreamHandshake::Rejected(rejected));
        }

        debug!(url = %url, "Event stream open");
        Ok(StreamHandshake::Open(decode_stream(response.bytes_stream())))
    }
}
