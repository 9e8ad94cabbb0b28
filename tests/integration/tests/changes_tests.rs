//! Changes gateway integration tests
//!
//! Each test spawns its own in-process gateway; no external services needed.
//!
//! Run with: cargo test -p integration-tests --test changes_tests

use std::time::Duration;

use changes_core::{DocumentChangeNotification, IndexChangeNotification, IndexChangeTypes};
use integration_tests::{
    assert_json, assert_status, next_change, next_frame, send_command, TestServer,
};
use reqwest::StatusCode;

// ============================================================================
// Health and stats
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_stats_counts_sessions() {
    let server = TestServer::start().await.expect("Failed to start server");

    let stats = assert_json(server.get("/changes/stats").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(stats["connections"], 0);

    let (_first, _) = server.connect_events(Some("stats-1")).await.unwrap();
    let (_second, _) = server.connect_events(Some("stats-2")).await.unwrap();

    let stats = assert_json(server.get("/changes/stats").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(stats["connections"], 2);
}

// ============================================================================
// Events socket
// ============================================================================

#[tokio::test]
async fn test_connected_frame_assigns_id() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (_socket, id) = server.connect_events(None).await.unwrap();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(server.registry().has_session(&id));
}

#[tokio::test]
async fn test_connected_frame_echoes_requested_id() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (_socket, id) = server.connect_events(Some("client-42")).await.unwrap();
    assert_eq!(id, "client-42");
}

#[tokio::test]
async fn test_watch_document_over_socket() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut socket, id) = server.connect_events(None).await.unwrap();

    send_command(&mut socket, "watch-doc", Some("users/1"))
        .await
        .unwrap();
    server
        .wait_for_session(&id, |s| s.is_watching_document("users/1"))
        .await
        .unwrap();

    let registry = server.registry();
    assert_eq!(
        registry.broadcast_document_change(&DocumentChangeNotification::put("users/2")),
        0
    );
    assert_eq!(
        registry.broadcast_document_change(&DocumentChangeNotification::put("USERS/1")),
        1
    );

    let change = next_change(&mut socket).await.unwrap();
    assert_eq!(change["Type"], "DocumentChangeNotification");
    assert_eq!(change["Value"]["Name"], "USERS/1");
    assert_eq!(change["Value"]["Type"], "Put");
}

#[tokio::test]
async fn test_invalid_socket_command_is_ignored() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut socket, id) = server.connect_events(None).await.unwrap();

    send_command(&mut socket, "watch-everything", None).await.unwrap();
    send_command(&mut socket, "watch-index", Some("Orders/Totals"))
        .await
        .unwrap();

    // The socket stays usable after a bad frame
    server
        .wait_for_session(&id, |s| s.is_watching_index("orders/totals"))
        .await
        .unwrap();
    assert!(server.registry().get(&id).unwrap().is_connected());
}

#[tokio::test]
async fn test_heartbeat_frames() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut socket, _) = server.connect_events(None).await.unwrap();

    let frame = next_frame(&mut socket).await.unwrap();
    assert_eq!(frame["Type"], "Heartbeat");
}

// ============================================================================
// HTTP control
// ============================================================================

#[tokio::test]
async fn test_configure_before_connect() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .configure("early", "watch-index", Some("Orders/Totals"))
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let session = server.registry().get("early").unwrap();
    assert!(!session.is_bound());

    // Buffered until the client shows up
    let notification =
        IndexChangeNotification::new("Orders/Totals", IndexChangeTypes::MapCompleted);
    assert_eq!(server.registry().broadcast_index_change(&notification), 1);
    assert_eq!(session.pending_count(), 1);

    let (mut socket, _) = server.connect_events(Some("early")).await.unwrap();
    let change = next_change(&mut socket).await.unwrap();
    assert_eq!(change["Type"], "IndexChangeNotification");
    assert_eq!(change["Value"]["Name"], "Orders/Totals");
    assert_eq!(change["Value"]["Type"], "MapCompleted");
}

#[tokio::test]
async fn test_configure_rejects_unknown_command() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.configure("c1", "watch-all-the-things", None).await.unwrap();
    let body = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body["code"], "INVALID_COMMAND");
    assert!(!server.registry().has_session("c1"));
}

#[tokio::test]
async fn test_configure_rejects_missing_value() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.configure("c1", "watch-doc", None).await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_configure_requires_id() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .get("/changes/config?command=watch-docs")
        .await
        .unwrap();
    let body = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
}

// ============================================================================
// Reconnect and expiry
// ============================================================================

#[tokio::test]
async fn test_reconnect_flushes_buffer_in_order() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (mut socket, id) = server.connect_events(Some("flaky")).await.unwrap();
    assert_status(
        server.configure(&id, "watch-docs", None).await.unwrap(),
        StatusCode::NO_CONTENT,
    )
    .await
    .unwrap();

    socket.close(None).await.unwrap();
    server
        .wait_for_session(&id, |s| !s.is_connected())
        .await
        .unwrap();

    for i in 0..3 {
        let notification = DocumentChangeNotification::put(format!("docs/{i}"));
        assert_eq!(server.registry().broadcast_document_change(&notification), 1);
    }

    let (mut socket, _) = server.connect_events(Some("flaky")).await.unwrap();
    for i in 0..3 {
        let change = next_change(&mut socket).await.unwrap();
        assert_eq!(change["Value"]["Name"], format!("docs/{i}"));
    }

    // Subscriptions survived the reconnect
    let session = server.registry().get("flaky").unwrap();
    assert!(session.is_watching_all_documents());
    assert_eq!(session.pending_count(), 0);
}

#[tokio::test]
async fn test_abandoned_session_expires() {
    let server = TestServer::start_with_expiry(Duration::from_millis(100))
        .await
        .expect("Failed to start server");

    let (mut socket, id) = server.connect_events(None).await.unwrap();
    socket.close(None).await.unwrap();

    server.wait_for_removal(&id).await.unwrap();
}

#[tokio::test]
async fn test_connected_session_does_not_expire() {
    let server = TestServer::start_with_expiry(Duration::from_millis(50))
        .await
        .expect("Failed to start server");

    let (_socket, id) = server.connect_events(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(server.registry().has_session(&id));
}
