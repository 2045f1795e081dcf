// Application Layer - Queue protocol, request building, response interpretation

pub mod queue;
pub mod request_builder;
pub mod response;
pub mod routes;

// Re-exports
pub use queue::{QueueClient, StatusStream, CANCELED_CODE};
pub use routes::{ApiRoutes, DEFAULT_BASE_URL};
