//! The remote matchmaking service seam.
//!
//! The coordinator never talks to the network itself. Callers implement
//! [`MatchmakingService`] over whatever RPC stack their backend speaks
//! (HTTP, WebSocket RPC, an in-process fake for tests) and hand it to
//! [`GatheringCoordinator::new`](crate::GatheringCoordinator::new).
//!
//! # Implementing a Service
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use gathering_client::error::Result;
//! use gathering_client::protocol::{
//!     CancelMatchmakingRequest, CreateGatheringRequest, DoMatchmakingRequest,
//!     DoMatchmakingResponse, Gathering,
//! };
//! use gathering_client::service::{GameSession, MatchmakingService};
//!
//! struct HttpService { /* ... */ }
//!
//! #[async_trait]
//! impl MatchmakingService for HttpService {
//!     async fn create_gathering(
//!         &self,
//!         session: &GameSession,
//!         request: CreateGatheringRequest,
//!     ) -> Result<Gathering> {
//!         // POST the request as JSON, decode the gathering
//!         todo!()
//!     }
//!
//!     async fn do_matchmaking(
//!         &self,
//!         session: &GameSession,
//!         request: DoMatchmakingRequest,
//!     ) -> Result<DoMatchmakingResponse> {
//!         todo!()
//!     }
//!
//!     async fn cancel_matchmaking(
//!         &self,
//!         session: &GameSession,
//!         request: CancelMatchmakingRequest,
//!     ) -> Result<()> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{
    CancelMatchmakingRequest, CreateGatheringRequest, DoMatchmakingRequest, DoMatchmakingResponse,
    Gathering,
};

/// An authenticated player session.
///
/// Obtained from the backend's login flow and injected into the coordinator;
/// `user_id` seeds the roster when this client creates a gathering.
#[derive(Clone, PartialEq, Eq)]
pub struct GameSession {
    pub user_id: String,
    pub access_token: String,
}

impl GameSession {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Remote operations of the matchmaking service.
///
/// Implementations report failures as
/// [`GatheringError::Remote`](crate::GatheringError::Remote) and must not
/// retry on their own: the coordinator surfaces every failure to its caller.
#[async_trait]
pub trait MatchmakingService: Send + Sync + 'static {
    /// Create a gathering with the requested role capacities.
    async fn create_gathering(
        &self,
        session: &GameSession,
        request: CreateGatheringRequest,
    ) -> Result<Gathering>;

    /// Run one step of the join handshake.
    ///
    /// Returns either a resolved gathering or a continuation token to pass to
    /// the next call.
    async fn do_matchmaking(
        &self,
        session: &GameSession,
        request: DoMatchmakingRequest,
    ) -> Result<DoMatchmakingResponse>;

    /// Withdraw from the named gathering.
    async fn cancel_matchmaking(
        &self,
        session: &GameSession,
        request: CancelMatchmakingRequest,
    ) -> Result<()>;
}
