// Credentials Resolver Port
// The transport adapter asks for the API key on every request

/// Default environment variable holding the API key
pub const DEFAULT_CREDENTIALS_ENV: &str = "SUNRA_KEY";

/// Credentials resolver interface
pub trait CredentialsResolver: Send + Sync {
    /// Resolve the API key (None = send unauthenticated)
    fn resolve(&self) -> Option<String>;
}

/// Fixed API key
#[derive(Clone)]
pub struct StaticCredentials {
    key: String,
}

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredentials(<redacted>)")
    }
}

impl CredentialsResolver for StaticCredentials {
    fn resolve(&self) -> Option<String> {
        Some(self.key.clone())
    }
}

/// API key read from an environment variable at request time
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_ENV)
    }
}

impl CredentialsResolver for EnvCredentials {
    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|k| !k.trim().is_empty())
    }
}

/// No credentials (e.g. when a proxy injects them)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialsResolver for NoCredentials {
    fn resolve(&self) -> Option<String> {
        None
    }
}
