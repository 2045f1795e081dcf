// API Routes
// Request-id-only addressing for every queue operation after submit

use crate::domain::EndpointId;

/// Default REST base URL
pub const DEFAULT_BASE_URL: &str = "https://api.sunra.ai/v1";

/// URL scheme of the queue API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    base_url: String,
}

impl ApiRoutes {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Direct execution path: `{base}/{endpoint}`
    pub fn run(&self, endpoint: &EndpointId) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// `{base}/queue/{endpoint}`
    pub fn submit(&self, endpoint: &EndpointId) -> String {
        format!("{}/queue/{}", self.base_url, endpoint)
    }

    /// `{base}/queue/requests/{id}/status`
    pub fn status(&self, request_id: &str) -> String {
        format!("{}/queue/requests/{}/status", self.base_url, request_id)
    }

    /// `{base}/queue/requests/{id}/status/stream`
    pub fn status_stream(&self, request_id: &str) -> String {
        format!("{}/stream", self.status(request_id))
    }

    /// `{base}/queue/requests/{id}`
    pub fn result(&self, request_id: &str) -> String {
        format!("{}/queue/requests/{}", self.base_url, request_id)
    }

    /// `{base}/queue/requests/{id}/cancel`
    pub fn cancel(&self, request_id: &str) -> String {
        format!("{}/cancel", self.result(request_id))
    }
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
