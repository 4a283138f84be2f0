//! Gateway end-to-end tests over real sockets
//!
//! Run with: cargo test -p relay-integration-tests --test gateway_tests

use relay_core::traits::MessageRepository;
use relay_integration_tests::{TestServer, WsClient, ALICE, BOB, CHAT_ROOM};
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

#[tokio::test]
async fn test_message_relay_and_unread_round_trip() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect(ALICE).await.unwrap();
    let mut bob = server.connect(BOB).await.unwrap();
    alice.join(CHAT_ROOM).await.unwrap();
    bob.join(CHAT_ROOM).await.unwrap();

    // The message row is written by the core before the relay
    let stored = server.store.append(CHAT_ROOM, ALICE, "hello bob").await.unwrap();
    alice
        .send("send_message", json!({"room_id": CHAT_ROOM, "text": "hello bob"}))
        .await
        .unwrap();

    let message = bob.expect("message").await.unwrap();
    assert_eq!(message["room_id"], CHAT_ROOM);
    assert_eq!(message["message_id"], stored.id);
    assert_eq!(message["from_user_id"], ALICE);
    assert_eq!(message["text"], "hello bob");

    let unread = bob.expect("unread_by_room").await.unwrap();
    assert_eq!(unread["by_room"][CHAT_ROOM.to_string()], 1);
    let total = bob.expect("unread_total").await.unwrap();
    assert_eq!(total["total"], 1);

    bob.send("read_room", json!({"room_id": CHAT_ROOM})).await.unwrap();
    let unread = bob.expect("unread_by_room").await.unwrap();
    assert_eq!(unread["by_room"][CHAT_ROOM.to_string()], 0);

    // The sender never hears its own message
    alice.sync().await.unwrap();
    bob.send("typing", json!({"room_id": CHAT_ROOM, "is_typing": true}))
        .await
        .unwrap();
    let first = alice.next_event().await.unwrap();
    assert_eq!(first["event"], "typing");
    assert_eq!(first["data"]["from_user_id"], BOB);
}

#[tokio::test]
async fn test_upgrade_with_bad_token_is_refused() {
    let server = TestServer::start().await.unwrap();

    let err = connect_async(server.gateway_url(Some("garbage")))
        .await
        .expect_err("upgrade must be refused");
    match err {
        WsError::Http(response) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected HTTP refusal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_in_band_authentication() {
    let server = TestServer::start().await.unwrap();
    let (stream, _) = connect_async(server.gateway_url(None)).await.unwrap();
    let mut client = WsClient::from_stream(stream);

    client
        .send("authenticate", json!({"token": server.token(BOB)}))
        .await
        .unwrap();
    let ready = client.expect("ready").await.unwrap();
    assert_eq!(ready["user_id"], BOB);
    assert_eq!(ready["store"], "connected");
}

#[tokio::test]
async fn test_frames_before_authentication_close_the_socket() {
    let server = TestServer::start().await.unwrap();
    let (stream, _) = connect_async(server.gateway_url(None)).await.unwrap();
    let mut client = WsClient::from_stream(stream);

    client.send("join_room", json!({"room_id": CHAT_ROOM})).await.unwrap();
    let error = client.expect("error").await.unwrap();
    assert_eq!(error["code"], "NOT_AUTHENTICATED");
    assert!(client.next_event().await.is_err());
}

#[tokio::test]
async fn test_readiness_counts_connections() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect(ALICE).await.unwrap();
    alice.join(CHAT_ROOM).await.unwrap();

    let body: serde_json::Value = server.get("/health/ready").await.unwrap().json().await.unwrap();
    assert_eq!(body["connections"], 1);
    assert_eq!(body["users"], 1);
    assert_eq!(body["rooms"], 1);
}
