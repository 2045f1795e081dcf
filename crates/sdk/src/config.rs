//! Client configuration

use std::sync::Arc;
use std::time::Duration;
use sunra_core::application::DEFAULT_BASE_URL;
use sunra_core::port::{CredentialsResolver, EnvCredentials, StaticCredentials};
use sunra_infra_http::{
    default_user_agent, HttpTransportConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};

pub const ENV_API_ENDPOINT: &str = "SUNRA_API_ENDPOINT";
pub const ENV_PROXY_URL: &str = "SUNRA_PROXY_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SUNRA_REQUEST_TIMEOUT_SECS";

/// Settings for [`SunraClient`](crate::SunraClient)
///
/// The API key itself is resolved per request through `credentials`
/// (`SUNRA_KEY` by default).
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Arc<dyn CredentialsResolver>,
    pub proxy_url: Option<String>,
    /// Applies to one-shot requests; the status stream has no overall timeout
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Arc::new(EnvCredentials::default()),
            proxy_url: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Read `SUNRA_API_ENDPOINT`, `SUNRA_PROXY_URL` and `SUNRA_REQUEST_TIMEOUT_SECS`;
    /// anything unset or unparseable keeps its default
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = non_empty(ENV_API_ENDPOINT).unwrap_or(defaults.base_url);
        let proxy_url = non_empty(ENV_PROXY_URL);
        let request_timeout = non_empty(ENV_REQUEST_TIMEOUT_SECS)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .or(defaults.request_timeout);

        Self {
            base_url,
            proxy_url,
            request_timeout,
            ..defaults
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a fixed API key
    pub fn key(self, key: impl Into<String>) -> Self {
        self.credentials(StaticCredentials::new(key))
    }

    pub fn credentials(mut self, credentials: impl CredentialsResolver + 'static) -> Self {
        self.credentials = Arc::new(credentials);
        self
    }

    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub(crate) fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            credentials: self.credentials.clone(),
            proxy_url: self.proxy_url.clone(),
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: default_user_agent(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("proxy_url", &self.proxy_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.proxy_url, None);
        assert_eq!(config.request_timeout, Some(DEFAULT_REQUEST_TIMEOUT));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_ENDPOINT, "http://127.0.0.1:9000/v1"),
            (ENV_PROXY_URL, "https://proxy.local/sunra"),
            (ENV_REQUEST_TIMEOUT_SECS, "5"),
        ]));
        assert_eq!(config.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.proxy_url.as_deref(), Some("https://proxy.local/sunra"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_unparseable_timeout_keeps_default() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_REQUEST_TIMEOUT_SECS, "soon"),
            (ENV_API_ENDPOINT, "  "),
        ]));
        assert_eq!(config.request_timeout, Some(DEFAULT_REQUEST_TIMEOUT));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = ClientConfig::default().key("very-secret");
        assert!(!format!("{:?}", config).contains("very-secret"));
        assert_eq!(config.credentials.resolve().as_deref(), Some("very-secret"));
    }
}
