//! REST and WebSocket API.

pub mod agents;
pub mod deployments;
pub mod error;
pub mod live_logs;
pub mod remote_configs;
pub mod server;
pub mod tools;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::{build_router, ApiServer, AppState};

use serde::{Deserialize, Serialize};

/// Body returned by delete endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
