// Sunra Infrastructure - HTTP Adapter
// Implements: HttpTransport (ADR-001)

pub mod reqwest_transport;
pub mod sse;

pub use reqwest_transport::{
    default_user_agent, HttpTransportConfig, ReqwestTransport, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, TARGET_URL_HEADER,
};
pub use sse::{decode_stream, SseDecoder};
