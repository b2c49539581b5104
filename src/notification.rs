//! Classification of raw push notifications.

use crate::error::Result;
use crate::protocol::{
    CompleteNotification, JoinNotification, LeaveNotification, NotificationMessage,
};

/// Issuer prefix used by the matchmaking service when none is configured.
pub const DEFAULT_ISSUER_PREFIX: &str = "Gs2Matchmaking";

/// A push notification the coordinator acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Join(JoinNotification),
    Leave(LeaveNotification),
    Complete(CompleteNotification),
}

impl Notification {
    /// Classify `message` against `issuer_prefix`.
    ///
    /// Returns `Ok(None)` for messages from another issuer and for event
    /// kinds this client does not handle. A `Complete` payload that is empty
    /// or undecodable still counts as completion since it carries nothing the
    /// coordinator needs.
    ///
    /// # Errors
    ///
    /// Returns [`GatheringError::Serialization`](crate::GatheringError::Serialization)
    /// when a `Join` or `Leave` payload cannot be decoded.
    pub fn classify(message: &NotificationMessage, issuer_prefix: &str) -> Result<Option<Self>> {
        let Some(event) = message
            .issuer
            .strip_prefix(issuer_prefix)
            .and_then(|rest| rest.strip_prefix(':'))
        else {
            return Ok(None);
        };

        let notification = if is_suffix(event, "Join") {
            Self::Join(serde_json::from_str(&message.payload)?)
        } else if is_suffix(event, "Leave") {
            Self::Leave(serde_json::from_str(&message.payload)?)
        } else if is_suffix(event, "Complete") {
            Self::Complete(serde_json::from_str(&message.payload).unwrap_or_default())
        } else {
            return Ok(None);
        };
        Ok(Some(notification))
    }
}

/// `event` is `name` itself or ends in `:name`.
fn is_suffix(event: &str, name: &str) -> bool {
    event == name
        || event
            .strip_suffix(name)
            .is_some_and(|head| head.ends_with(':'))
}
