#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for the gathering client.
//!
//! Requests must serialize with the service's camelCase field names, and
//! responses / notifications captured from the service must decode.

use gathering_client::error_codes::ErrorCode;
use gathering_client::notification::{Notification, DEFAULT_ISSUER_PREFIX};
use gathering_client::protocol::{
    CancelMatchmakingRequest, CapacityOfRole, CreateGatheringRequest, DoMatchmakingRequest,
    DoMatchmakingResponse, Gathering, NotificationMessage, Player,
};
use serde_json::json;

// ════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════

#[test]
fn create_gathering_request_wire_shape() {
    let request = CreateGatheringRequest {
        namespace_name: "ns".into(),
        player: Player::with_role("default"),
        capacity_of_roles: vec![CapacityOfRole::new("default", 4)],
        allow_user_ids: vec![],
        attribute_ranges: vec![],
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        json!({
            "namespaceName": "ns",
            "player": { "roleName": "default" },
            "capacityOfRoles": [
                { "roleName": "default", "roleAliases": [], "capacity": 4, "participants": [] }
            ],
            "allowUserIds": [],
            "attributeRanges": []
        })
    );
}

#[test]
fn fresh_attempt_omits_context_token() {
    let request = DoMatchmakingRequest {
        namespace_name: "ns".into(),
        player: Player::with_role("default"),
        matchmaking_context_token: None,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert!(value.get("matchmakingContextToken").is_none());

    let resumed = DoMatchmakingRequest {
        matchmaking_context_token: Some("opaque==".into()),
        ..request
    };
    let value = serde_json::to_value(&resumed).unwrap();
    assert_eq!(value["matchmakingContextToken"], "opaque==");
}

#[test]
fn cancel_request_wire_shape() {
    let request = CancelMatchmakingRequest {
        namespace_name: "ns".into(),
        gathering_name: "g1".into(),
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({ "namespaceName": "ns", "gatheringName": "g1" })
    );
}

// ════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════

#[test]
fn gathering_decodes_from_service_fixture() {
    let fixture = r#"{
        "gatheringId": "grn:gs2:ap-northeast-1:owner:matchmaking:ns:gathering:0a1b",
        "name": "0a1b",
        "attributeRanges": [{ "name": "rating", "min": 1000, "max": 1500 }],
        "capacityOfRoles": [{
            "roleName": "default",
            "roleAliases": [],
            "capacity": 2,
            "participants": [
                { "userId": "user-0001", "roleName": "default", "attributes": [] }
            ]
        }],
        "allowUserIds": [],
        "expiresAt": 1700000600000,
        "createdAt": 1700000000000,
        "updatedAt": 1700000000000
    }"#;
    let gathering: Gathering = serde_json::from_str(fixture).unwrap();
    assert_eq!(gathering.name, "0a1b");
    assert_eq!(gathering.total_capacity(), 2);
    assert_eq!(gathering.participant_count(), 1);
    assert_eq!(
        gathering.capacity_of_roles[0].participants[0].user_id.as_deref(),
        Some("user-0001")
    );
    assert_eq!(gathering.attribute_ranges[0].max, 1500);
    assert_eq!(gathering.expires_at, Some(1_700_000_600_000));
    assert!(gathering.metadata.is_none());
}

#[test]
fn minimal_gathering_uses_defaults() {
    let gathering: Gathering = serde_json::from_str(r#"{"name":"g1"}"#).unwrap();
    assert_eq!(gathering.name, "g1");
    assert!(gathering.capacity_of_roles.is_empty());
    assert_eq!(gathering.total_capacity(), 0);
}

#[test]
fn pending_and_resolved_matchmaking_responses() {
    let pending: DoMatchmakingResponse =
        serde_json::from_str(r#"{"matchmakingContextToken":"T1"}"#).unwrap();
    assert!(pending.item.is_none());
    assert_eq!(pending.matchmaking_context_token.as_deref(), Some("T1"));

    let resolved: DoMatchmakingResponse =
        serde_json::from_str(r#"{"item":{"name":"g1"},"matchmakingContextToken":null}"#).unwrap();
    assert_eq!(resolved.item.map(|g| g.name).as_deref(), Some("g1"));
    assert!(resolved.matchmaking_context_token.is_none());
}

#[test]
fn error_code_decodes_inside_payload() {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error_code: ErrorCode,
    }
    let env: Envelope = serde_json::from_str(r#"{"error_code":"NOT_FOUND"}"#).unwrap();
    assert_eq!(env.error_code, ErrorCode::NotFound);
}

// ════════════════════════════════════════════════════════════════════
// Notifications
// ════════════════════════════════════════════════════════════════════

#[test]
fn notification_frame_carries_payload_as_string() {
    let frame = r#"{"issuer":"Gs2Matchmaking:Join","payload":"{\"namespaceName\":\"ns\",\"gatheringName\":\"g1\",\"joinUserId\":\"p2\"}"}"#;
    let message: NotificationMessage = serde_json::from_str(frame).unwrap();
    match Notification::classify(&message, DEFAULT_ISSUER_PREFIX).unwrap() {
        Some(Notification::Join(join)) => {
            assert_eq!(join.join_user_id, "p2");
            assert_eq!(join.namespace_name.as_deref(), Some("ns"));
        }
        other => panic!("expected Join, got {other:?}"),
    }
}

#[test]
fn notification_without_payload_field_defaults_to_empty() {
    let message: NotificationMessage =
        serde_json::from_str(r#"{"issuer":"Gs2Matchmaking:Complete"}"#).unwrap();
    assert!(message.payload.is_empty());
    assert!(matches!(
        Notification::classify(&message, DEFAULT_ISSUER_PREFIX).unwrap(),
        Some(Notification::Complete(_))
    ));
}

#[test]
fn custom_issuer_prefix() {
    let message = NotificationMessage::new("Lobby:Leave", r#"{"leaveUserId":"p4"}"#);
    assert!(Notification::classify(&message, DEFAULT_ISSUER_PREFIX)
        .unwrap()
        .is_none());
    assert!(matches!(
        Notification::classify(&message, "Lobby").unwrap(),
        Some(Notification::Leave(leave)) if leave.leave_user_id == "p4"
    ));
}
