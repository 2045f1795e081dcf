//! Sunra SDK - Rust Client Library
//!
//! Submits requests to the Sunra queue, follows their status over a
//! server-sent event stream and fetches the final result.
//!
//! # Example
//!
//! ```no_run
//! use sunra_sdk::{BlockingSunraClient, ClientConfig, SubscribeOptions};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BlockingSunraClient::new(ClientConfig::from_env().key("your-api-key"))?;
//!
//!     let output = client.subscribe(
//!         "black-forest-labs/flux-kontext-pro/text-to-image",
//!         SubscribeOptions::with_input(json!({"prompt": "a lighthouse at dusk"})),
//!     )?;
//!
//!     println!("Request {} finished: {}", output.request_id, output.data);
//!     Ok(())
//! }
//! ```

mod blocking;
mod client;
mod config;

pub use blocking::{BlockingQueueClient, BlockingSunraClient};
pub use client::SunraClient;
pub use config::{ClientConfig, ENV_API_ENDPOINT, ENV_PROXY_URL, ENV_REQUEST_TIMEOUT_SECS};

pub use sunra_core::application::{QueueClient, StatusStream, DEFAULT_BASE_URL};
pub use sunra_core::domain::{
    Canceled, Completed, EndpointId, HttpMethod, InProgress, InQueue, Output, QueueCancelOptions,
    QueueResultOptions, QueueStatus, QueueStatusOptions, QueueSubmitOptions,
    QueueSubscribeOptions, RunOptions, StatusKind, SubscribeOptions, WaitMode,
    DEFAULT_POLL_INTERVAL,
};
pub use sunra_core::port::{
    CredentialsResolver, EnvCredentials, HttpTransport, NoCredentials, StaticCredentials,
};
pub use sunra_core::{ErrorKind, RateLimitInfo, Result, SunraError};
