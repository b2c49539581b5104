//! Error classes reported by the matchmaking service.
//!
//! The service tags every failed call with one of a fixed set of exception
//! classes. They serialize as `SCREAMING_SNAKE_CASE` strings
//! (e.g. `"QUOTA_EXCEEDED"`). Unrecognized classes decode as
//! [`ErrorCode::Unknown`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error classes returned by the matchmaking service.
///
/// Use [`description()`](ErrorCode::description) for a human-readable
/// explanation and [`is_transient()`](ErrorCode::is_transient) to decide
/// whether the caller may reasonably retry the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request errors
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    QuotaExceeded,

    // Service errors
    RequestTimeout,
    InternalServerError,
    ServiceUnavailable,

    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// Returns a human-readable description of this error class.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BadRequest => {
                "The request was rejected as malformed. Check the namespace, role and capacity parameters."
            }
            Self::Unauthorized => {
                "The session is missing or expired. Log in again to obtain a fresh access token."
            }
            Self::NotFound => {
                "The namespace or gathering does not exist. It may have been closed or already matched."
            }
            Self::Conflict => {
                "The gathering changed concurrently. Retry the operation against the latest state."
            }
            Self::QuotaExceeded => {
                "The request exceeded a service quota. Try again later or raise the quota."
            }
            Self::RequestTimeout => {
                "The service did not answer in time. The operation may or may not have been applied."
            }
            Self::InternalServerError => {
                "An internal service error occurred. Please try again or contact support if the issue persists."
            }
            Self::ServiceUnavailable => {
                "The service is temporarily unavailable. Please try again in a few moments."
            }
            Self::Unknown => "The service reported an unrecognized error class.",
        }
    }

    /// Whether retrying the same call later can succeed without changing it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Conflict
                | Self::QuotaExceeded
                | Self::RequestTimeout
                | Self::InternalServerError
                | Self::ServiceUnavailable
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
