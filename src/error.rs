//! Error types for the gathering client.

use thiserror::Error;

use crate::error_codes::ErrorCode;

/// Errors that can occur when driving the matchmaking handshake.
#[derive(Debug, Error)]
pub enum GatheringError {
    /// A remote call (create, matchmaking attempt or cancel) failed.
    #[error("remote call failed: {message}")]
    Remote {
        /// Human-readable error message from the service.
        message: String,
        /// Structured error class, if the service provided one.
        error_code: Option<ErrorCode>,
    },

    /// Attempted a cancel while no gathering is held.
    #[error("no active gathering")]
    NoActiveGathering,

    /// A create or join call is already in flight.
    #[error("a create or join call is already in flight")]
    Busy,

    /// The service answered with a response the handshake cannot continue from.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to receive a frame from the push channel.
    #[error("transport receive error: {0}")]
    TransportReceive(String),
}

impl GatheringError {
    /// Build a [`Remote`](GatheringError::Remote) error.
    pub fn remote(message: impl Into<String>, error_code: Option<ErrorCode>) -> Self {
        Self::Remote {
            message: message.into(),
            error_code,
        }
    }

    /// Structured error class for remote failures.
    pub fn error_code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Remote { error_code, .. } => error_code.as_ref(),
            _ => None,
        }
    }
}

/// A specialized [`Result`] type for gathering client operations.
pub type Result<T> = std::result::Result<T, GatheringError>;
