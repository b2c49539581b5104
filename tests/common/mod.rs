#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for gathering client integration tests.
//!
//! Provides a channel-driven [`MockService`] whose responses the test feeds
//! one at a time, a channel-based [`MockNotificationTransport`], and helpers
//! for building gatherings and notification frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use gathering_client::error::Result;
use gathering_client::protocol::{
    CancelMatchmakingRequest, CapacityOfRole, CreateGatheringRequest, DoMatchmakingRequest,
    DoMatchmakingResponse, Gathering, NotificationMessage,
};
use gathering_client::{
    GameSession, GatheringCoordinator, GatheringError, MatchmakingConfig, MatchmakingEvent,
    MatchmakingService, NotificationTransport,
};
use tokio::sync::{mpsc, Mutex};

pub const CALLER_ID: &str = "user-0001";
pub const NAMESPACE: &str = "matchmaking-ns";

// ── MockService ─────────────────────────────────────────────────────

/// A request the coordinator sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Create(CreateGatheringRequest),
    DoMatchmaking(DoMatchmakingRequest),
    Cancel(CancelMatchmakingRequest),
}

/// A service whose calls block until the test supplies a response.
///
/// Responses queued before the call are consumed immediately. A closed
/// script channel answers with a remote error.
pub struct MockService {
    creates: Mutex<mpsc::UnboundedReceiver<Result<Gathering>>>,
    attempts: Mutex<mpsc::UnboundedReceiver<Result<DoMatchmakingResponse>>>,
    cancels: Mutex<mpsc::UnboundedReceiver<Result<()>>>,
    requests: Arc<StdMutex<Vec<RecordedRequest>>>,
}

/// The test's side of a [`MockService`].
pub struct ServiceScript {
    pub creates: mpsc::UnboundedSender<Result<Gathering>>,
    pub attempts: mpsc::UnboundedSender<Result<DoMatchmakingResponse>>,
    pub cancels: mpsc::UnboundedSender<Result<()>>,
    pub requests: Arc<StdMutex<Vec<RecordedRequest>>>,
}

impl ServiceScript {
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until at least `count` requests have been recorded.
    pub async fn wait_for_requests(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.requests.lock().unwrap().len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for service requests");
    }
}

pub fn mock_service() -> (MockService, ServiceScript) {
    let (creates_tx, creates_rx) = mpsc::unbounded_channel();
    let (attempts_tx, attempts_rx) = mpsc::unbounded_channel();
    let (cancels_tx, cancels_rx) = mpsc::unbounded_channel();
    let requests = Arc::new(StdMutex::new(Vec::new()));
    let service = MockService {
        creates: Mutex::new(creates_rx),
        attempts: Mutex::new(attempts_rx),
        cancels: Mutex::new(cancels_rx),
        requests: Arc::clone(&requests),
    };
    let script = ServiceScript {
        creates: creates_tx,
        attempts: attempts_tx,
        cancels: cancels_tx,
        requests,
    };
    (service, script)
}

async fn next<T>(rx: &Mutex<mpsc::UnboundedReceiver<Result<T>>>) -> Result<T> {
    rx.lock()
        .await
        .recv()
        .await
        .unwrap_or_else(|| Err(GatheringError::remote("script closed", None)))
}

#[async_trait]
impl MatchmakingService for MockService {
    async fn create_gathering(
        &self,
        session: &GameSession,
        request: CreateGatheringRequest,
    ) -> Result<Gathering> {
        assert_eq!(session.user_id, CALLER_ID);
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest::Create(request));
        next(&self.creates).await
    }

    async fn do_matchmaking(
        &self,
        _session: &GameSession,
        request: DoMatchmakingRequest,
    ) -> Result<DoMatchmakingResponse> {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest::DoMatchmaking(request));
        next(&self.attempts).await
    }

    async fn cancel_matchmaking(
        &self,
        _session: &GameSession,
        request: CancelMatchmakingRequest,
    ) -> Result<()> {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest::Cancel(request));
        next(&self.cancels).await
    }
}

/// Build a coordinator over a fresh [`MockService`].
pub fn start_coordinator() -> (
    GatheringCoordinator<MockService>,
    mpsc::Receiver<MatchmakingEvent>,
    ServiceScript,
) {
    let (service, script) = mock_service();
    let (coordinator, events) = GatheringCoordinator::new(
        service,
        GameSession::new(CALLER_ID, "access-token"),
        MatchmakingConfig::new(NAMESPACE),
    );
    (coordinator, events, script)
}

/// Everything currently queued on the event channel.
pub fn drain_events(rx: &mut mpsc::Receiver<MatchmakingEvent>) -> Vec<MatchmakingEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn count_match_complete(events: &[MatchmakingEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, MatchmakingEvent::MatchComplete { .. }))
        .count()
}

// ── MockNotificationTransport ───────────────────────────────────────

/// A push channel the test writes frames into.
pub struct MockNotificationTransport {
    rx: mpsc::UnboundedReceiver<Option<Result<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockNotificationTransport {
    /// Returns the transport, a sender for scripted frames (`None` closes
    /// the channel cleanly) and the closed flag.
    pub fn new() -> (
        Self,
        mpsc::UnboundedSender<Option<Result<String>>>,
        Arc<AtomicBool>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            rx,
            closed: Arc::clone(&closed),
        };
        (transport, tx, closed)
    }
}

#[async_trait]
impl NotificationTransport for MockNotificationTransport {
    async fn recv(&mut self) -> Option<Result<String>> {
        match self.rx.recv().await {
            Some(item) => item,
            // Sender dropped: hang so the listener stays alive until shutdown.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── Builders ────────────────────────────────────────────────────────

pub fn gathering(name: &str, capacity: u32) -> Gathering {
    Gathering {
        gathering_id: format!("grn:matchmaking:{NAMESPACE}:gathering:{name}"),
        name: name.into(),
        attribute_ranges: vec![],
        capacity_of_roles: vec![CapacityOfRole::new("default", capacity)],
        allow_user_ids: vec![],
        metadata: None,
        expires_at: None,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
    }
}

pub fn join_message(user_id: &str) -> NotificationMessage {
    NotificationMessage::new(
        "Gs2Matchmaking:Join",
        serde_json::json!({ "namespaceName": NAMESPACE, "joinUserId": user_id }).to_string(),
    )
}

pub fn leave_message(user_id: &str) -> NotificationMessage {
    NotificationMessage::new(
        "Gs2Matchmaking:Leave",
        serde_json::json!({ "namespaceName": NAMESPACE, "leaveUserId": user_id }).to_string(),
    )
}

pub fn complete_message() -> NotificationMessage {
    NotificationMessage::new(
        "Gs2Matchmaking:Complete",
        serde_json::json!({ "namespaceName": NAMESPACE }).to_string(),
    )
}

/// A notification serialized the way the push channel frames it.
pub fn frame(message: &NotificationMessage) -> String {
    serde_json::to_string(message).expect("notification frame serialization")
}
