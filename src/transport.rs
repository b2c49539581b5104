//! Push-channel abstraction.
//!
//! The [`NotificationTransport`] trait is the receive side of the service's
//! push channel. Each call to [`recv`](NotificationTransport::recv) yields one
//! complete text frame holding a JSON-encoded
//! [`NotificationMessage`](crate::protocol::NotificationMessage); framing is
//! the transport's concern (a WebSocket gateway, SSE events, a test channel).
//!
//! # Connection Setup
//!
//! Connecting and authenticating the channel is NOT part of this trait.
//! Construct a connected transport externally, then pass it to
//! `NotificationListener::spawn`.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use gathering_client::error::GatheringError;
//! use gathering_client::transport::NotificationTransport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl NotificationTransport for MyTransport {
//!     async fn recv(&mut self) -> Option<Result<String, GatheringError>> {
//!         // Return None when the channel is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), GatheringError> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::GatheringError;

/// The receive side of a push-notification channel.
///
/// # Cancel Safety
///
/// [`recv`](NotificationTransport::recv) **MUST** be cancel-safe because the
/// listener polls it inside `tokio::select!`. Channel-based implementations
/// (e.g. wrapping `mpsc::Receiver`) are naturally cancel-safe.
#[async_trait]
pub trait NotificationTransport: Send + 'static {
    /// Receive the next text frame.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete frame was received
    /// - `Some(Err(e))` — a transport error occurred
    /// - `None` — the channel was closed cleanly
    async fn recv(&mut self) -> Option<Result<String, GatheringError>>;

    /// Close the channel gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails. Implementations should
    /// still release resources in that case.
    async fn close(&mut self) -> Result<(), GatheringError>;
}
