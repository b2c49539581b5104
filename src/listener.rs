//! Background task feeding push notifications into a coordinator.
//!
//! [`NotificationListener::spawn`] takes a connected
//! [`NotificationTransport`] and a [`GatheringCoordinator`] clone, and runs a
//! loop that decodes each text frame as a [`NotificationMessage`] and hands
//! it to [`GatheringCoordinator::handle_notification`]. When the channel
//! stops, a `NotificationsClosed` event is emitted on the coordinator's
//! event channel.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = MyPushChannel::connect(push_url).await?;
//! let mut listener = NotificationListener::spawn(transport, coordinator.clone());
//!
//! let gathering = coordinator.join_gathering().await?;
//! // ...
//! listener.shutdown().await;
//! ```

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::coordinator::GatheringCoordinator;
use crate::event::MatchmakingEvent;
use crate::protocol::NotificationMessage;
use crate::service::MatchmakingService;
use crate::transport::NotificationTransport;

/// Handle to a running notification loop.
///
/// Dropping the handle aborts the loop without closing the transport; call
/// [`shutdown`](NotificationListener::shutdown) for a graceful stop.
pub struct NotificationListener {
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl NotificationListener {
    /// Spawn the notification loop on the current Tokio runtime.
    ///
    /// The graceful shutdown timeout comes from the coordinator's
    /// [`MatchmakingConfig`](crate::MatchmakingConfig).
    #[must_use = "dropping the listener aborts the notification loop"]
    pub fn spawn<S: MatchmakingService>(
        transport: impl NotificationTransport,
        coordinator: GatheringCoordinator<S>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let shutdown_timeout = coordinator.config().shutdown_timeout;
        let task = tokio::spawn(listen_loop(transport, coordinator, shutdown_rx));
        Self {
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout,
        }
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop the loop, closing the transport.
    ///
    /// Waits up to the configured shutdown timeout for the loop to exit, then
    /// aborts it.
    pub async fn shutdown(&mut self) {
        debug!("NotificationListener: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("notification loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("notification loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("notification loop aborted: {join_err}");
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for NotificationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationListener")
            .field("finished", &self.is_finished())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        // No executor is available here to drive `transport.close()`.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Exits when the transport closes, fails, or shutdown is signalled.
async fn listen_loop<S: MatchmakingService>(
    mut transport: impl NotificationTransport,
    coordinator: GatheringCoordinator<S>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("notification loop started");

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                if let Err(e) = transport.close().await {
                    debug!("notification transport close failed: {e}");
                }
                break Some("listener shut down".to_string());
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        let message = match serde_json::from_str::<NotificationMessage>(&text) {
                            Ok(message) => message,
                            Err(e) => {
                                warn!("failed to deserialize notification: {e}; raw: {text}");
                                continue;
                            }
                        };
                        debug!(issuer = %message.issuer, "notification received");
                        if let Err(e) = coordinator.handle_notification(&message).await {
                            warn!(issuer = %message.issuer, "failed to apply notification: {e}");
                        }
                    }
                    Some(Err(e)) => {
                        error!("notification transport error: {e}");
                        break Some(format!("transport receive error: {e}"));
                    }
                    None => {
                        debug!("notification channel closed by server");
                        break None;
                    }
                }
            }
        }
    };

    coordinator
        .emit(MatchmakingEvent::NotificationsClosed { reason })
        .await;
    debug!("notification loop exited");
}
