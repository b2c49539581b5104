//! # Gathering Client
//!
//! Async client for gathering-based matchmaking.
//!
//! A [`GatheringCoordinator`] creates or joins a gathering through a
//! [`MatchmakingService`] you implement, threads the service's context token
//! through the join handshake until it resolves, and reconciles the result
//! with `Join` / `Leave` / `Complete` push notifications that may arrive
//! before, during or after that handshake.
//!
//! ## Features
//!
//! - **Service-agnostic** — implement [`MatchmakingService`] for any RPC stack
//! - **Race-free completion** — `MatchComplete` fires exactly once whether the
//!   notification beats the join response or not
//! - **Bring your own push channel** — implement [`NotificationTransport`]
//!   and the default `tokio-runtime` feature's `NotificationListener` feeds it
//!   into the coordinator
//! - **Event-driven** — receive typed [`MatchmakingEvent`]s via a channel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let (coordinator, mut events) = GatheringCoordinator::new(
//!     my_service,
//!     GameSession::new(user_id, access_token),
//!     MatchmakingConfig::new("matchmaking-ns"),
//! );
//! let push = MyPushChannel::connect(push_url).await?;
//! let _listener = NotificationListener::spawn(push, coordinator.clone());
//!
//! coordinator.join_gathering().await?;
//! while let Some(event) = events.recv().await {
//!     if let MatchmakingEvent::MatchComplete { roster, .. } = event {
//!         println!("matched with {roster:?}");
//!         break;
//!     }
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod error_codes;
pub mod event;
#[cfg(feature = "tokio-runtime")]
pub mod listener;
pub mod notification;
pub mod protocol;
pub mod roster;
pub mod service;
pub mod transport;

// Re-export primary types for ergonomic imports.
pub use coordinator::{GatheringCoordinator, MatchmakingConfig};
pub use error::GatheringError;
pub use error_codes::ErrorCode;
pub use event::MatchmakingEvent;
#[cfg(feature = "tokio-runtime")]
pub use listener::NotificationListener;
pub use protocol::{Gathering, NotificationMessage};
pub use roster::JoinedPlayerRoster;
pub use service::{GameSession, MatchmakingService};
pub use transport::NotificationTransport;
