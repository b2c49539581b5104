//! Wire-compatible protocol types for the matchmaking service.
//!
//! Every type here serializes with the service's `camelCase` field names so
//! that a [`MatchmakingService`](crate::service::MatchmakingService)
//! implementation can put them on the wire unchanged. Optional collections
//! default to empty when absent from a response.

use serde::{Deserialize, Serialize};

/// Role used when the caller does not configure one.
pub const DEFAULT_ROLE_NAME: &str = "default";

// ── Gathering ───────────────────────────────────────────────────────

/// A numeric attribute window a joining player must fall inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRange {
    pub name: String,
    pub min: i32,
    pub max: i32,
}

/// A named player attribute used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub value: i32,
}

/// A player as seen by the matchmaking service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Filled in by the service; requests leave it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny_user_ids: Vec<String>,
}

impl Player {
    /// A request-side player that only names its role.
    pub fn with_role(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            ..Default::default()
        }
    }
}

/// Capacity and current participants for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityOfRole {
    pub role_name: String,
    #[serde(default)]
    pub role_aliases: Vec<String>,
    pub capacity: u32,
    #[serde(default)]
    pub participants: Vec<Player>,
}

impl CapacityOfRole {
    /// A request-side capacity entry with no aliases and no participants.
    pub fn new(role_name: impl Into<String>, capacity: u32) -> Self {
        Self {
            role_name: role_name.into(),
            role_aliases: Vec::new(),
            capacity,
            participants: Vec::new(),
        }
    }
}

/// A server-side matchmaking lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gathering {
    #[serde(default)]
    pub gathering_id: String,
    /// Identifier used to address the gathering (e.g. when cancelling).
    pub name: String,
    #[serde(default)]
    pub attribute_ranges: Vec<AttributeRange>,
    #[serde(default)]
    pub capacity_of_roles: Vec<CapacityOfRole>,
    #[serde(default)]
    pub allow_user_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Gathering {
    /// Total capacity across every role.
    pub fn total_capacity(&self) -> u32 {
        self.capacity_of_roles.iter().map(|r| r.capacity).sum()
    }

    /// Number of participants the service reported across every role.
    pub fn participant_count(&self) -> usize {
        self.capacity_of_roles
            .iter()
            .map(|r| r.participants.len())
            .sum()
    }
}

// ── Requests ────────────────────────────────────────────────────────

/// Create a new gathering and join it as its first participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGatheringRequest {
    pub namespace_name: String,
    pub player: Player,
    pub capacity_of_roles: Vec<CapacityOfRole>,
    pub allow_user_ids: Vec<String>,
    pub attribute_ranges: Vec<AttributeRange>,
}

/// One step of the join handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoMatchmakingRequest {
    pub namespace_name: String,
    pub player: Player,
    /// `None` starts a fresh attempt; `Some` resumes the previous one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchmaking_context_token: Option<String>,
}

/// Response to a [`DoMatchmakingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoMatchmakingResponse {
    /// The gathering joined, once the attempt resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Gathering>,
    /// Continuation token for the next attempt when unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchmaking_context_token: Option<String>,
}

impl DoMatchmakingResponse {
    /// A terminal response carrying the joined gathering.
    pub fn resolved(gathering: Gathering) -> Self {
        Self {
            item: Some(gathering),
            matchmaking_context_token: None,
        }
    }

    /// A non-terminal response asking the caller to try again with `token`.
    pub fn pending(token: impl Into<String>) -> Self {
        Self {
            item: None,
            matchmaking_context_token: Some(token.into()),
        }
    }
}

/// Withdraw from a gathering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelMatchmakingRequest {
    pub namespace_name: String,
    pub gathering_name: String,
}

// ── Push notifications ──────────────────────────────────────────────

/// A raw push notification frame.
///
/// `issuer` has the form `"<Service>:<Event>"`; `payload` is a JSON document
/// encoded as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub issuer: String,
    #[serde(default)]
    pub payload: String,
}

impl NotificationMessage {
    pub fn new(issuer: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            payload: payload.into(),
        }
    }
}

/// Payload of a `:Join` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gathering_name: Option<String>,
    pub join_user_id: String,
}

/// Payload of a `:Leave` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gathering_name: Option<String>,
    pub leave_user_id: String,
}

/// Payload of a `:Complete` notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gathering_name: Option<String>,
}
