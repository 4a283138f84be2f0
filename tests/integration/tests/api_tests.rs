//! REST end-to-end tests
//!
//! Run with: cargo test -p relay-integration-tests --test api_tests

use relay_integration_tests::{TestServer, ADMIN, ALICE, BOB, SUPPORT_ROOM};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_ticket_lifecycle_reaches_room_sockets() {
    let server = TestServer::start().await.unwrap();
    let mut admin = server.connect(ADMIN).await.unwrap();
    admin.join(SUPPORT_ROOM).await.unwrap();

    let (status, opened) = server
        .call(
            Method::POST,
            "/api/v1/support-events",
            ALICE,
            Some(json!({"chat_room_id": SUPPORT_ROOM})),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(opened["status"], "open");
    let id = opened["id"].as_i64().unwrap();

    let pushed = admin.expect("event:new").await.unwrap();
    assert_eq!(pushed["chat_room_id"], SUPPORT_ROOM);
    assert_eq!(pushed["event"]["id"], id);

    let status_path = format!("/api/v1/support-events/{id}/status");
    for to in ["in_progress", "resolved"] {
        let (status, _) = server
            .call(Method::PATCH, &status_path, ADMIN, Some(json!({"status": to})))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        admin.expect("event:update").await.unwrap();
    }

    let (status, closed) = server
        .call(
            Method::PATCH,
            &status_path,
            ALICE,
            Some(json!({"status": "closed_by_customer", "rating": 5, "review": "Thanks"})),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["rating"], 5);
    admin.expect("event:closed").await.unwrap();

    let transitions: Vec<(serde_json::Value, serde_json::Value)> = closed["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|log| (log["old_status"].clone(), log["new_status"].clone()))
        .collect();
    assert_eq!(
        transitions,
        vec![
            (json!(null), json!("open")),
            (json!("open"), json!("in_progress")),
            (json!("in_progress"), json!("resolved")),
            (json!("resolved"), json!("closed_by_customer")),
        ]
    );

    let (status, body) = server
        .call(
            Method::POST,
            &format!("/api/v1/support-events/{id}/rating"),
            ALICE,
            Some(json!({"rating": 3})),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_RATED");
}

#[tokio::test]
async fn test_non_participant_is_forbidden() {
    let server = TestServer::start().await.unwrap();

    let (status, body) = server
        .call(
            Method::POST,
            "/api/v1/support-events",
            BOB,
            Some(json!({"chat_room_id": SUPPORT_ROOM})),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "NOT_ROOM_PARTICIPANT");
}

#[tokio::test]
async fn test_legacy_credential_is_accepted() {
    let server = TestServer::start().await.unwrap();
    let legacy = relay_common::LegacyClaims {
        user_id: ALICE,
        exp: 4_102_444_800,
    }
    .encode();

    let response = server
        .client
        .get(format!("{}/api/v1/auth/principal", server.base_url()))
        .bearer_auth(legacy)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], ALICE);
    assert_eq!(body["scheme"], "legacy");
}
