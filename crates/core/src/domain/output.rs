// Output - terminal result wrapper

use serde::{Deserialize, Serialize};

/// Final payload paired with the request id that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output<T> {
    pub data: T,
    pub request_id: String,
}

impl<T> Output<T> {
    pub fn new(data: T, request_id: impl Into<String>) -> Self {
        Self {
            data,
            request_id: request_id.into(),
        }
    }

    pub fn into_data(self) -> T {
        self.data
    }

    /// Transform the payload, keeping the request id
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Output<U> {
        Output {
            data: f(self.data),
            request_id: self.request_id,
        }
    }
}
