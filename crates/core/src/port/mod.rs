// Port Layer - Interfaces for external dependencies

pub mod credentials;
pub mod transport;

// Re-exports
pub use credentials::{
    CredentialsResolver, EnvCredentials, NoCredentials, StaticCredentials,
    DEFAULT_CREDENTIALS_ENV,
};
pub use transport::{
    EventStream, HttpRequest, HttpResponse, HttpTransport, SseEvent, StreamHandshake,
};
