//! IPC error types

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    /// Frame is not valid hex or not a valid message
    #[error("codec error: {message}")]
    Codec { message: String },

    /// No reply signal within the client's wait bound
    #[error("server didn't respond after {timeout_ms} ms")]
    ReplyTimeout { timeout_ms: u64 },

    /// Start was signaled but no request frame arrived in time
    #[error("client didn't send a request within {timeout_ms} ms")]
    RequestTimeout { timeout_ms: u64 },

    /// The server-side transaction loop is gone
    #[error("service loop stopped: {message}")]
    Stopped { message: String },

    /// Transport failure
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl IpcError {
    /// Create codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, IpcError>;
