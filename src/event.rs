//! Events emitted by the [`GatheringCoordinator`](crate::GatheringCoordinator).

use crate::error::GatheringError;
use crate::error_codes::ErrorCode;
use crate::protocol::Gathering;

/// A state change the UI layer may want to react to.
///
/// Received from the channel returned by
/// [`GatheringCoordinator::new`](crate::GatheringCoordinator::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchmakingEvent {
    /// The roster changed (or was re-announced).
    RosterUpdated {
        gathering: Option<Gathering>,
        roster: Vec<String>,
    },
    /// A `Join` notification arrived.
    PlayerJoined {
        gathering: Option<Gathering>,
        player_id: String,
    },
    /// A `Leave` notification arrived.
    PlayerLeft {
        gathering: Option<Gathering>,
        player_id: String,
    },
    /// The service declared the held gathering complete.
    ///
    /// Emitted at most once per gathering.
    MatchComplete {
        gathering: Gathering,
        roster: Vec<String>,
    },
    /// Matchmaking for `gathering` was cancelled by this client.
    MatchCancelled { gathering: Gathering },
    /// A remote call failed.
    Error {
        message: String,
        error_code: Option<ErrorCode>,
    },
    /// The push channel stopped; no further `PlayerJoined`, `PlayerLeft` or
    /// `MatchComplete` events will arrive from it.
    NotificationsClosed { reason: Option<String> },
}

impl MatchmakingEvent {
    /// Events that must reach the receiver even when the channel is full.
    pub(crate) fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::MatchComplete { .. }
                | Self::MatchCancelled { .. }
                | Self::Error { .. }
                | Self::NotificationsClosed { .. }
        )
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::RosterUpdated { .. } => "roster_updated",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::MatchComplete { .. } => "match_complete",
            Self::MatchCancelled { .. } => "match_cancelled",
            Self::Error { .. } => "error",
            Self::NotificationsClosed { .. } => "notifications_closed",
        }
    }
}

impl From<&GatheringError> for MatchmakingEvent {
    fn from(err: &GatheringError) -> Self {
        match err {
            GatheringError::Remote {
                message,
                error_code,
            } => Self::Error {
                message: message.clone(),
                error_code: error_code.clone(),
            },
            other => Self::Error {
                message: other.to_string(),
                error_code: None,
            },
        }
    }
}
