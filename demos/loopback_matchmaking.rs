//! # Loopback Matchmaking Demo
//!
//! Wires a [`GatheringCoordinator`] to an in-process fake service and push
//! channel. The fake service answers the first matchmaking attempt with a
//! context token and pushes `Join` + `Complete` notifications *before*
//! resolving the second attempt, so the demo shows completion being deferred
//! until the join resolves.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example loopback_matchmaking
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use gathering_client::error::Result;
use gathering_client::protocol::{
    CancelMatchmakingRequest, CapacityOfRole, CreateGatheringRequest, DoMatchmakingRequest,
    DoMatchmakingResponse, Gathering, NotificationMessage,
};
use gathering_client::{
    GameSession, GatheringCoordinator, GatheringError, MatchmakingConfig, MatchmakingEvent,
    MatchmakingService, NotificationListener, NotificationTransport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: A push channel backed by an in-process queue
// ─────────────────────────────────────────────────────────────────────

struct LoopbackPush {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl NotificationTransport for LoopbackPush {
    async fn recv(&mut self) -> Option<std::result::Result<String, GatheringError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> std::result::Result<(), GatheringError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: A fake matchmaking service
// ─────────────────────────────────────────────────────────────────────

struct LoopbackService {
    push: mpsc::UnboundedSender<String>,
    attempts: AtomicU32,
}

impl LoopbackService {
    fn push(&self, issuer: &str, payload: serde_json::Value) {
        let frame = NotificationMessage::new(issuer, payload.to_string());
        if let Ok(text) = serde_json::to_string(&frame) {
            let _ = self.push.send(text);
        }
    }
}

fn new_gathering(capacity: u32) -> Gathering {
    let name = uuid::Uuid::new_v4().to_string();
    Gathering {
        gathering_id: format!("grn:matchmaking:demo:gathering:{name}"),
        name,
        attribute_ranges: vec![],
        capacity_of_roles: vec![CapacityOfRole::new("default", capacity)],
        allow_user_ids: vec![],
        metadata: None,
        expires_at: None,
        created_at: 0,
        updated_at: 0,
    }
}

#[async_trait]
impl MatchmakingService for LoopbackService {
    async fn create_gathering(
        &self,
        _session: &GameSession,
        request: CreateGatheringRequest,
    ) -> Result<Gathering> {
        let capacity: u32 = request
            .capacity_of_roles
            .iter()
            .map(|r| r.capacity)
            .sum();
        Ok(new_gathering(capacity))
    }

    async fn do_matchmaking(
        &self,
        _session: &GameSession,
        request: DoMatchmakingRequest,
    ) -> Result<DoMatchmakingResponse> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            attempt,
            token = ?request.matchmaking_context_token,
            "service: matchmaking attempt"
        );
        if request.matchmaking_context_token.is_none() {
            return Ok(DoMatchmakingResponse::pending(format!("ctx-{attempt}")));
        }

        // The backend decides the match before answering this attempt.
        self.push(
            "Gs2Matchmaking:Join",
            serde_json::json!({ "joinUserId": "opponent-42" }),
        );
        self.push("Gs2Matchmaking:Complete", serde_json::json!({}));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        Ok(DoMatchmakingResponse::resolved(new_gathering(2)))
    }

    async fn cancel_matchmaking(
        &self,
        _session: &GameSession,
        request: CancelMatchmakingRequest,
    ) -> Result<()> {
        tracing::info!(gathering = %request.gathering_name, "service: cancel");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Run the handshake
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (push_tx, push_rx) = mpsc::unbounded_channel();
    let service = LoopbackService {
        push: push_tx,
        attempts: AtomicU32::new(0),
    };
    let (coordinator, mut events) = GatheringCoordinator::new(
        service,
        GameSession::new("demo-player", "demo-token"),
        MatchmakingConfig::new("demo"),
    );
    let mut listener =
        NotificationListener::spawn(LoopbackPush { rx: push_rx }, coordinator.clone());

    let gathering = coordinator.join_gathering().await?;
    tracing::info!(gathering = %gathering.name, "joined");

    while let Some(event) = events.recv().await {
        match event {
            MatchmakingEvent::PlayerJoined { player_id, .. } => {
                tracing::info!("Event: PlayerJoined {player_id}");
            }
            MatchmakingEvent::MatchComplete { gathering, roster } => {
                tracing::info!("Event: MatchComplete {} with {roster:?}", gathering.name);
                break;
            }
            other => tracing::info!("Event: {other:?}"),
        }
    }

    listener.shutdown().await;
    Ok(())
}
