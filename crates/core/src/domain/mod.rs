// Domain Layer - Endpoint ids, request options, queue statuses, output

pub mod endpoint;
pub mod options;
pub mod output;
pub mod status;

// Re-exports
pub use endpoint::{EndpointId, RESERVED_NAMESPACES};
pub use options::{
    ApiOptions, HttpMethod, QueueCancelOptions, QueueResultOptions, QueueStatusOptions,
    QueueSubmitOptions, QueueSubscribeOptions, QueueUpdateCallback, RunOptions, SubscribeOptions,
    WaitMode, DEFAULT_POLL_INTERVAL,
};
pub use output::Output;
pub use status::{
    Canceled, Completed, FailurePayload, InProgress, InQueue, QueueStatus, RequestHandle,
    RequestId, StatusKind,
};
