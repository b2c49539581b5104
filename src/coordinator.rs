//! Client-side gathering handshake.
//!
//! [`GatheringCoordinator`] owns this client's view of one gathering: the
//! gathering itself, the roster of joined players and the completion latch.
//! Handshake calls ([`create_gathering`](GatheringCoordinator::create_gathering),
//! [`join_gathering`](GatheringCoordinator::join_gathering),
//! [`cancel_matchmaking`](GatheringCoordinator::cancel_matchmaking)) go through
//! the injected [`MatchmakingService`]. Push notifications arrive through
//! [`handle_notification`](GatheringCoordinator::handle_notification), usually
//! driven by a `NotificationListener`, and may interleave with an in-flight
//! handshake call. Every state change is reported on the event channel
//! returned from [`GatheringCoordinator::new`].
//!
//! # Example
//!
//! ```rust,ignore
//! let session = GameSession::new("user-0001", access_token);
//! let config = MatchmakingConfig::new("matchmaking-ns");
//! let (coordinator, mut events) = GatheringCoordinator::new(service, session, config);
//!
//! let gathering = coordinator.join_gathering().await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         MatchmakingEvent::MatchComplete { roster, .. } => { /* start the game */ }
//!         MatchmakingEvent::Error { message, .. } => { /* … */ }
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::error::{GatheringError, Result};
use crate::event::MatchmakingEvent;
use crate::notification::{Notification, DEFAULT_ISSUER_PREFIX};
use crate::protocol::{
    CancelMatchmakingRequest, CapacityOfRole, CreateGatheringRequest, DoMatchmakingRequest,
    Gathering, NotificationMessage, Player, DEFAULT_ROLE_NAME,
};
use crate::roster::JoinedPlayerRoster;
use crate::service::{GameSession, MatchmakingService};

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the notification listener's graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`GatheringCoordinator`].
///
/// The only required field is the matchmaking namespace; all others have
/// sensible defaults.
///
/// # Example
///
/// ```
/// use gathering_client::coordinator::MatchmakingConfig;
///
/// let config = MatchmakingConfig::new("matchmaking-ns");
/// assert_eq!(config.namespace_name, "matchmaking-ns");
/// assert_eq!(config.role_name, "default");
/// ```
///
/// # Tuning
///
/// ```
/// use gathering_client::coordinator::MatchmakingConfig;
/// use std::time::Duration;
///
/// let config = MatchmakingConfig::new("matchmaking-ns")
///     .with_role_name("attacker")
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct MatchmakingConfig {
    /// Matchmaking namespace every request is addressed to.
    pub namespace_name: String,
    /// Role this client requests when creating or joining.
    ///
    /// Defaults to **`"default"`**.
    pub role_name: String,
    /// Issuer prefix of push notifications this coordinator reacts to.
    /// Notifications from other issuers are ignored.
    ///
    /// Defaults to **`"Gs2Matchmaking"`**.
    pub issuer_prefix: String,
    /// Capacity of the bounded event channel.
    ///
    /// Roster and player events are dropped (with a warning logged) when the
    /// consumer falls behind. `MatchComplete`, `MatchCancelled`, `Error` and
    /// `NotificationsClosed` wait for room instead.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Time a `NotificationListener` gets to close its transport on
    /// shutdown before its task is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl MatchmakingConfig {
    /// Create a configuration for `namespace_name` with default values.
    pub fn new(namespace_name: impl Into<String>) -> Self {
        Self {
            namespace_name: namespace_name.into(),
            role_name: DEFAULT_ROLE_NAME.to_string(),
            issuer_prefix: DEFAULT_ISSUER_PREFIX.to_string(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the role requested on create and join.
    #[must_use]
    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = role_name.into();
        self
    }

    /// Set the issuer prefix of push notifications to react to.
    #[must_use]
    pub fn with_issuer_prefix(mut self, issuer_prefix: impl Into<String>) -> Self {
        self.issuer_prefix = issuer_prefix.into();
        self
    }

    /// Set the capacity of the bounded event channel (clamped to at least 1).
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the notification listener's graceful shutdown timeout.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CoordinatorState {
    gathering: Option<Gathering>,
    roster: JoinedPlayerRoster,
    /// Latched by a `Complete` notification.
    completed: bool,
    /// `MatchComplete` was already emitted for the held gathering.
    complete_fired: bool,
    /// The last lifecycle ended (completed or cancelled); the next create or
    /// join starts from a clean roster and latch.
    stale: bool,
}

impl CoordinatorState {
    fn begin_lifecycle(&mut self) {
        if self.stale {
            debug!("state: previous gathering finished, clearing roster and latch");
            self.roster.clear();
            self.completed = false;
            self.complete_fired = false;
            self.stale = false;
        }
    }

    fn hold(&mut self, gathering: Gathering) {
        self.gathering = Some(gathering);
        self.complete_fired = false;
    }

    /// Mark the held gathering complete and build its `MatchComplete`.
    fn fire_complete(&mut self) -> Option<MatchmakingEvent> {
        let gathering = self.gathering.clone()?;
        self.complete_fired = true;
        self.stale = true;
        debug!(
            gathering = %gathering.name,
            players = self.roster.len(),
            "matchmaking complete"
        );
        Some(MatchmakingEvent::MatchComplete {
            gathering,
            roster: self.roster.snapshot(),
        })
    }

    fn roster_updated(&self) -> MatchmakingEvent {
        MatchmakingEvent::RosterUpdated {
            gathering: self.gathering.clone(),
            roster: self.roster.snapshot(),
        }
    }
}

struct Inner<S> {
    service: S,
    session: GameSession,
    config: MatchmakingConfig,
    state: Mutex<CoordinatorState>,
    /// Held while events are sent; taken before `state`, never by accessors.
    emit_order: Mutex<()>,
    in_flight: AtomicBool,
    event_tx: mpsc::Sender<MatchmakingEvent>,
}

/// Releases the single create/join slot when dropped, including when the
/// handshake future itself is dropped mid-flight.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Coordinator handle ──────────────────────────────────────────────

/// Drives the create / join / cancel handshake for one client.
///
/// Cheap to clone; clones share the same state and event channel, which is
/// how a `NotificationListener` feeds notifications into it.
pub struct GatheringCoordinator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for GatheringCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: MatchmakingService> GatheringCoordinator<S> {
    /// Create a coordinator and the receiver for its events.
    ///
    /// # Arguments
    ///
    /// * `service` — The remote matchmaking service.
    /// * `session` — The authenticated session every call is made with.
    /// * `config` — Namespace, role and channel tuning.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn new(
        service: S,
        session: GameSession,
        config: MatchmakingConfig,
    ) -> (Self, mpsc::Receiver<MatchmakingEvent>) {
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel(capacity);

        let coordinator = Self {
            inner: Arc::new(Inner {
                service,
                session,
                config,
                state: Mutex::new(CoordinatorState::default()),
                emit_order: Mutex::new(()),
                in_flight: AtomicBool::new(false),
                event_tx,
            }),
        };
        (coordinator, event_rx)
    }

    // ── Handshake ───────────────────────────────────────────────────

    /// Create a gathering with a single role of `capacity` slots, open to
    /// anyone.
    ///
    /// On success the roster is reset to this client's own user id and a
    /// `RosterUpdated` event is emitted.
    ///
    /// A `Complete` notification latched before or during this call is not
    /// emitted for the created gathering; only [`join_gathering`] fires a
    /// deferred completion. A `Complete` arriving after this call returns
    /// fires immediately.
    ///
    /// [`join_gathering`]: GatheringCoordinator::join_gathering
    ///
    /// # Errors
    ///
    /// - [`GatheringError::Busy`] if another create or join is in flight.
    /// - Whatever the service returns; it is also emitted as an `Error`
    ///   event and leaves state untouched.
    pub async fn create_gathering(&self, capacity: u32) -> Result<Gathering> {
        let _guard = self.begin().await?;
        let config = &self.inner.config;

        let request = CreateGatheringRequest {
            namespace_name: config.namespace_name.clone(),
            player: Player::with_role(config.role_name.clone()),
            capacity_of_roles: vec![CapacityOfRole::new(config.role_name.clone(), capacity)],
            allow_user_ids: Vec::new(),
            attribute_ranges: Vec::new(),
        };
        debug!(
            namespace = %config.namespace_name,
            role = %config.role_name,
            capacity,
            "creating gathering"
        );

        let gathering = match self
            .inner
            .service
            .create_gathering(&self.inner.session, request)
            .await
        {
            Ok(gathering) => gathering,
            Err(e) => {
                warn!("create gathering failed: {e}");
                self.report(&e).await;
                return Err(e);
            }
        };

        let user_id = self.inner.session.user_id.clone();
        self.update(|state, events| {
            state.roster.reset_to(user_id);
            state.hold(gathering.clone());
            debug!(gathering = %gathering.name, "state: created gathering");
            events.push(state.roster_updated());
        })
        .await;

        Ok(gathering)
    }

    /// Join any gathering that will take this client.
    ///
    /// Keeps calling the service's matchmaking operation, threading its
    /// context token through, until it either resolves a gathering or fails.
    /// There is no local timeout; drop the returned future to give up.
    ///
    /// If a `Complete` notification was latched while the attempt was
    /// pending, `MatchComplete` is emitted right after the gathering is
    /// stored.
    ///
    /// # Errors
    ///
    /// - [`GatheringError::Busy`] if another create or join is in flight.
    /// - [`GatheringError::Protocol`] if the service answers with neither a
    ///   gathering nor a continuation token.
    /// - Whatever the service returns.
    ///
    /// Protocol and service errors are also emitted as an `Error` event.
    pub async fn join_gathering(&self) -> Result<Gathering> {
        let _guard = self.begin().await?;
        let config = &self.inner.config;

        let mut context_token: Option<String> = None;
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            debug!(
                namespace = %config.namespace_name,
                attempt,
                resuming = context_token.is_some(),
                "matchmaking attempt"
            );
            let request = DoMatchmakingRequest {
                namespace_name: config.namespace_name.clone(),
                player: Player::with_role(config.role_name.clone()),
                matchmaking_context_token: context_token.take(),
            };

            let response = match self
                .inner
                .service
                .do_matchmaking(&self.inner.session, request)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("matchmaking attempt {attempt} failed: {e}");
                    self.report(&e).await;
                    return Err(e);
                }
            };

            if let Some(gathering) = response.item {
                self.update(|state, events| {
                    state.hold(gathering.clone());
                    debug!(gathering = %gathering.name, attempt, "state: joined gathering");
                    if state.completed {
                        debug!("completion was latched before the join resolved");
                        events.extend(state.fire_complete());
                    }
                })
                .await;
                return Ok(gathering);
            }

            match response.matchmaking_context_token {
                Some(token) => context_token = Some(token),
                None => {
                    let e = GatheringError::Protocol(
                        "matchmaking response carried neither a gathering nor a context token"
                            .into(),
                    );
                    warn!("{e}");
                    self.report(&e).await;
                    return Err(e);
                }
            }
        }
    }

    /// Withdraw from the held gathering.
    ///
    /// On success emits `MatchCancelled` and forgets the gathering. If a join
    /// is in flight, a latched completion is kept for the gathering that
    /// join resolves.
    ///
    /// # Errors
    ///
    /// - [`GatheringError::NoActiveGathering`] if no gathering is held; no
    ///   request is sent and no event is emitted.
    /// - Whatever the service returns; it is also emitted as an `Error`
    ///   event and the gathering stays held.
    pub async fn cancel_matchmaking(&self) -> Result<()> {
        let gathering = self
            .inner
            .state
            .lock()
            .await
            .gathering
            .clone()
            .ok_or(GatheringError::NoActiveGathering)?;

        debug!(gathering = %gathering.name, "cancelling matchmaking");
        let request = CancelMatchmakingRequest {
            namespace_name: self.inner.config.namespace_name.clone(),
            gathering_name: gathering.name.clone(),
        };
        if let Err(e) = self
            .inner
            .service
            .cancel_matchmaking(&self.inner.session, request)
            .await
        {
            warn!("cancel matchmaking failed: {e}");
            self.report(&e).await;
            return Err(e);
        }

        let joining = self.is_busy();
        self.update(|state, events| {
            // A join may have replaced the gathering while the cancel was out.
            if state
                .gathering
                .as_ref()
                .is_some_and(|held| held.name == gathering.name)
            {
                state.gathering = None;
                if !joining {
                    state.completed = false;
                    state.stale = true;
                }
                debug!(joining, "state: cancelled gathering {}", gathering.name);
            }
            events.push(MatchmakingEvent::MatchCancelled { gathering });
        })
        .await;
        Ok(())
    }

    // ── Push notifications ──────────────────────────────────────────

    /// Apply a raw push notification.
    ///
    /// Messages from other issuers, and event kinds other than `Join`,
    /// `Leave` and `Complete`, are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatheringError::Serialization`] if a `Join` or `Leave`
    /// payload is malformed; state is left untouched.
    pub async fn handle_notification(&self, message: &NotificationMessage) -> Result<()> {
        match Notification::classify(message, &self.inner.config.issuer_prefix)? {
            Some(Notification::Join(join)) => self.handle_join(join.join_user_id).await,
            Some(Notification::Leave(leave)) => self.handle_leave(&leave.leave_user_id).await,
            Some(Notification::Complete(_)) => self.handle_complete().await,
            None => debug!(issuer = %message.issuer, "ignoring notification"),
        }
        Ok(())
    }

    /// A player joined the gathering.
    pub async fn handle_join(&self, player_id: impl Into<String>) {
        let player_id = player_id.into();
        self.update(|state, events| {
            if !state.roster.add(player_id.clone()) {
                debug!(player = %player_id, "duplicate join notification");
            }
            events.push(MatchmakingEvent::PlayerJoined {
                gathering: state.gathering.clone(),
                player_id,
            });
            events.push(state.roster_updated());
        })
        .await;
    }

    /// A player left the gathering.
    pub async fn handle_leave(&self, player_id: &str) {
        self.update(|state, events| {
            if !state.roster.remove(player_id) {
                debug!(player = %player_id, "leave notification for unknown player");
            }
            events.push(MatchmakingEvent::PlayerLeft {
                gathering: state.gathering.clone(),
                player_id: player_id.to_string(),
            });
            events.push(state.roster_updated());
        })
        .await;
    }

    /// The service declared matchmaking complete.
    ///
    /// Emits `MatchComplete` now if a gathering is held; otherwise the
    /// completion is latched and the pending join emits it once the
    /// gathering arrives.
    pub async fn handle_complete(&self) {
        self.update(|state, events| {
            // The notification can beat the matchmaking response back.
            if state.gathering.is_none() {
                debug!("completion latched, no gathering held yet");
            } else if !state.complete_fired {
                events.extend(state.fire_complete());
            }
            state.completed = true;
        })
        .await;
    }

    // ── State accessors ─────────────────────────────────────────────

    /// The gathering currently held, if any.
    pub async fn current_gathering(&self) -> Option<Gathering> {
        self.inner.state.lock().await.gathering.clone()
    }

    /// Snapshot of the joined-player roster.
    pub async fn roster(&self) -> Vec<String> {
        self.inner.state.lock().await.roster.snapshot()
    }

    /// Whether a `Complete` notification has been latched.
    pub async fn is_completed(&self) -> bool {
        self.inner.state.lock().await.completed
    }

    /// Whether a create or join call is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// The session calls are made with.
    pub fn session(&self) -> &GameSession {
        &self.inner.session
    }

    /// The configuration this coordinator was built with.
    pub fn config(&self) -> &MatchmakingConfig {
        &self.inner.config
    }

    /// Forget the held gathering, the roster and the completion latch.
    pub async fn reset(&self) {
        *self.inner.state.lock().await = CoordinatorState::default();
        debug!("state: reset");
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Claim the create/join slot and start a fresh lifecycle if the last
    /// one finished.
    async fn begin(&self) -> Result<InFlightGuard<'_>> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GatheringError::Busy);
        }
        let guard = InFlightGuard(&self.inner.in_flight);
        self.inner.state.lock().await.begin_lifecycle();
        Ok(guard)
    }

    /// Apply `change` under the state lock, then send the events it
    /// produced after the lock is released.
    ///
    /// Events from concurrent updates reach the channel in the order their
    /// changes were applied.
    async fn update(
        &self,
        change: impl FnOnce(&mut CoordinatorState, &mut Vec<MatchmakingEvent>),
    ) {
        let _order = self.inner.emit_order.lock().await;
        let mut events = Vec::new();
        {
            let mut state = self.inner.state.lock().await;
            change(&mut *state, &mut events);
        }
        for event in events {
            emit_event(&self.inner.event_tx, event).await;
        }
    }

    async fn report(&self, err: &GatheringError) {
        self.emit(MatchmakingEvent::from(err)).await;
    }

    pub(crate) async fn emit(&self, event: MatchmakingEvent) {
        let _order = self.inner.emit_order.lock().await;
        emit_event(&self.inner.event_tx, event).await;
    }
}

impl<S> std::fmt::Debug for GatheringCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatheringCoordinator")
            .field("namespace", &self.inner.config.namespace_name)
            .field("user_id", &self.inner.session.user_id)
            .field("busy", &self.inner.in_flight.load(Ordering::Acquire))
            .finish()
    }
}

/// Emit an event to the event channel.
///
/// Critical events wait for room; the rest are dropped with a warning when
/// the channel is full so notification handling never stalls on a slow UI.
async fn emit_event(event_tx: &mpsc::Sender<MatchmakingEvent>, event: MatchmakingEvent) {
    if event.is_critical() {
        if event_tx.send(event).await.is_err() {
            debug!("event channel closed, receiver dropped");
        }
        return;
    }
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!("event channel full, dropping event: {}", dropped.kind());
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::protocol::DoMatchmakingResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Scripted service ────────────────────────────────────────────

    /// Replays scripted responses in order; an exhausted script is a remote error.
    #[derive(Default)]
    struct ScriptedService {
        creates: StdMutex<VecDeque<Result<Gathering>>>,
        attempts: StdMutex<VecDeque<Result<DoMatchmakingResponse>>>,
        cancels: StdMutex<VecDeque<Result<()>>>,
        tokens_seen: Arc<StdMutex<Vec<Option<String>>>>,
    }

    fn exhausted<T>() -> Result<T> {
        Err(GatheringError::remote("script exhausted", None))
    }

    #[async_trait]
    impl MatchmakingService for ScriptedService {
        async fn create_gathering(
            &self,
            _session: &GameSession,
            _request: CreateGatheringRequest,
        ) -> Result<Gathering> {
            self.creates
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(exhausted)
        }

        async fn do_matchmaking(
            &self,
            _session: &GameSession,
            request: DoMatchmakingRequest,
        ) -> Result<DoMatchmakingResponse> {
            self.tokens_seen
                .lock()
                .unwrap()
                .push(request.matchmaking_context_token);
            self.attempts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(exhausted)
        }

        async fn cancel_matchmaking(
            &self,
            _session: &GameSession,
            _request: CancelMatchmakingRequest,
        ) -> Result<()> {
            self.cancels
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(exhausted)
        }
    }

    fn gathering(name: &str) -> Gathering {
        Gathering {
            gathering_id: format!("grn:gathering:{name}"),
            name: name.into(),
            attribute_ranges: vec![],
            capacity_of_roles: vec![CapacityOfRole::new("default", 2)],
            allow_user_ids: vec![],
            metadata: None,
            expires_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn start(
        service: ScriptedService,
    ) -> (
        GatheringCoordinator<ScriptedService>,
        mpsc::Receiver<MatchmakingEvent>,
    ) {
        GatheringCoordinator::new(
            service,
            GameSession::new("me", "token"),
            MatchmakingConfig::new("ns"),
        )
    }

    fn drain(rx: &mut mpsc::Receiver<MatchmakingEvent>) -> Vec<MatchmakingEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    // ── Config ──────────────────────────────────────────────────────

    #[test]
    fn config_defaults() {
        let config = MatchmakingConfig::new("ns");
        assert_eq!(config.role_name, DEFAULT_ROLE_NAME);
        assert_eq!(config.issuer_prefix, DEFAULT_ISSUER_PREFIX);
        assert_eq!(config.event_channel_capacity, DEFAULT_EVENT_CHANNEL_CAPACITY);
        assert_eq!(config.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
    }

    #[test]
    fn config_clamps_channel_capacity() {
        let config = MatchmakingConfig::new("ns").with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    // ── Lifecycle bookkeeping ───────────────────────────────────────

    #[tokio::test]
    async fn second_join_after_completion_does_not_refire() {
        let service = ScriptedService::default();
        service.attempts.lock().unwrap().extend([
            Ok(DoMatchmakingResponse::resolved(gathering("g1"))),
            Ok(DoMatchmakingResponse::resolved(gathering("g2"))),
        ]);
        let (coordinator, mut events) = start(service);

        coordinator.join_gathering().await.unwrap();
        coordinator.handle_complete().await;
        let fired = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, MatchmakingEvent::MatchComplete { .. }))
            .count();
        assert_eq!(fired, 1);

        // The finished lifecycle's latch must not leak into the next join.
        coordinator.join_gathering().await.unwrap();
        assert!(!coordinator.is_completed().await);
        assert!(drain(&mut events)
            .iter()
            .all(|e| !matches!(e, MatchmakingEvent::MatchComplete { .. })));
    }

    #[tokio::test]
    async fn duplicate_complete_fires_once() {
        let service = ScriptedService::default();
        service
            .creates
            .lock()
            .unwrap()
            .push_back(Ok(gathering("g1")));
        let (coordinator, mut events) = start(service);

        coordinator.create_gathering(2).await.unwrap();
        coordinator.handle_complete().await;
        coordinator.handle_complete().await;

        let fired = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, MatchmakingEvent::MatchComplete { .. }))
            .count();
        assert_eq!(fired, 1);
        assert!(coordinator.is_completed().await);
    }

    #[tokio::test]
    async fn in_flight_slot_is_released_after_error() {
        let (coordinator, _events) = start(ScriptedService::default());
        assert!(coordinator.join_gathering().await.is_err());
        assert!(!coordinator.is_busy());
        assert!(coordinator.create_gathering(2).await.is_err());
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn token_is_threaded_between_attempts() {
        let service = ScriptedService::default();
        let tokens = Arc::clone(&service.tokens_seen);
        service.attempts.lock().unwrap().extend([
            Ok(DoMatchmakingResponse::pending("T1")),
            Ok(DoMatchmakingResponse::pending("T2")),
            Ok(DoMatchmakingResponse::resolved(gathering("g1"))),
        ]);
        let (coordinator, _events) = start(service);

        let joined = coordinator.join_gathering().await.unwrap();
        assert_eq!(joined.name, "g1");
        assert_eq!(
            *tokens.lock().unwrap(),
            vec![None, Some("T1".to_string()), Some("T2".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_response_is_a_protocol_error() {
        let service = ScriptedService::default();
        service
            .attempts
            .lock()
            .unwrap()
            .push_back(Ok(DoMatchmakingResponse::default()));
        let (coordinator, mut events) = start(service);

        let err = coordinator.join_gathering().await.unwrap_err();
        assert!(matches!(err, GatheringError::Protocol(_)));
        let events = drain(&mut events);
        assert!(matches!(
            events.as_slice(),
            [MatchmakingEvent::Error { error_code: None, .. }]
        ));
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let service = ScriptedService::default();
        service
            .creates
            .lock()
            .unwrap()
            .push_back(Ok(gathering("g1")));
        let (coordinator, _events) = start(service);

        coordinator.create_gathering(2).await.unwrap();
        coordinator.handle_complete().await;
        coordinator.reset().await;

        assert!(coordinator.current_gathering().await.is_none());
        assert!(coordinator.roster().await.is_empty());
        assert!(!coordinator.is_completed().await);
    }

    #[tokio::test]
    async fn full_channel_drops_roster_events_but_keeps_completion() {
        let service = ScriptedService::default();
        service
            .creates
            .lock()
            .unwrap()
            .push_back(Ok(gathering("g1")));
        let (coordinator, mut events) = GatheringCoordinator::new(
            service,
            GameSession::new("me", "token"),
            MatchmakingConfig::new("ns").with_event_channel_capacity(1),
        );

        // Fills the single slot with RosterUpdated.
        coordinator.create_gathering(2).await.unwrap();
        // Both events from this join are dropped.
        coordinator.handle_join("p2").await;

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.handle_complete().await })
        };
        let first = events.recv().await.unwrap();
        assert!(matches!(first, MatchmakingEvent::RosterUpdated { .. }));
        let second = events.recv().await.unwrap();
        match second {
            MatchmakingEvent::MatchComplete { roster, .. } => {
                assert_eq!(roster, vec!["me".to_string(), "p2".to_string()]);
            }
            other => panic!("expected MatchComplete, got {other:?}"),
        }
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn accessors_respond_while_completion_waits_for_room() {
        let service = ScriptedService::default();
        service
            .creates
            .lock()
            .unwrap()
            .push_back(Ok(gathering("g1")));
        let (coordinator, mut events) = GatheringCoordinator::new(
            service,
            GameSession::new("me", "token"),
            MatchmakingConfig::new("ns").with_event_channel_capacity(1),
        );

        // RosterUpdated takes the only slot.
        coordinator.create_gathering(2).await.unwrap();

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.handle_complete().await })
        };
        let within = Duration::from_secs(2);
        tokio::time::timeout(within, async {
            while !coordinator.is_completed().await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("completion was never latched");
        assert!(!waiter.is_finished());

        let held = tokio::time::timeout(within, coordinator.current_gathering())
            .await
            .expect("current_gathering blocked behind a pending send");
        assert_eq!(held.map(|g| g.name).as_deref(), Some("g1"));
        let roster = tokio::time::timeout(within, coordinator.roster())
            .await
            .expect("roster blocked behind a pending send");
        assert_eq!(roster, vec!["me".to_string()]);

        assert!(matches!(
            events.recv().await,
            Some(MatchmakingEvent::RosterUpdated { .. })
        ));
        assert!(matches!(
            events.recv().await,
            Some(MatchmakingEvent::MatchComplete { .. })
        ));
        waiter.await.unwrap();
    }

    #[test]
    fn debug_omits_access_token() {
        let (coordinator, _events) = start(ScriptedService::default());
        let rendered = format!("{coordinator:?}");
        assert!(rendered.contains("GatheringCoordinator"));
        assert!(!rendered.contains("token"));
    }
}
