use actix_web::http::StatusCode;
use order_bridge_engine::ConnectionManagement;
use serde_json::{json, Value};

use super::helpers::TestServer;
use crate::data_objects::StatusResponse;

async fn status(server: &TestServer) -> StatusResponse {
    let (code, body) = server.get("/api/status").await;
    assert_eq!(code, StatusCode::OK);
    serde_json::from_str(&body).expect("Invalid status response")
}

#[actix_web::test]
async fn fresh_server_is_disconnected() {
    let server = TestServer::new().await;
    let s = status(&server).await;
    assert!(!s.connected);
    assert!(!s.listening);
    assert_eq!(s.state, "Disconnected");
    assert_eq!(s.order_count, 0);
    server.finish().await;
}

#[actix_web::test]
async fn connect_and_disconnect() {
    let server = TestServer::new().await;
    let (code, body) = server.post_json("/api/connect", json!({"username": "alice", "password": "pw"})).await;
    assert_eq!(code, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert!(server.manager.ingestion().has_listener());

    let s = status(&server).await;
    assert!(s.connected);
    assert!(s.listening);
    assert_eq!(s.state, "Listening");

    let (code, _) = server.post_json("/api/disconnect", json!({"username": "alice"})).await;
    assert_eq!(code, StatusCode::OK);
    let s = status(&server).await;
    assert!(!s.connected);
    assert!(!s.listening);
    let record = server.db.find_by_principal("alice").await.unwrap().expect("Session record was removed");
    assert!(!record.active);
    server.finish().await;
}

#[actix_web::test]
async fn rejected_login_is_unauthorized() {
    let server = TestServer::new().await;
    let (code, body) = server.post_json("/api/connect", json!({"username": "alice", "password": ""})).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Authentication failed for alice"));
    let s = status(&server).await;
    assert!(!s.connected);
    assert!(!s.listening);
    server.finish().await;
}

#[actix_web::test]
async fn disconnecting_an_unknown_user_is_not_found() {
    let server = TestServer::new().await;
    let (code, body) = server.post_json("/api/disconnect", json!({"username": "unknown"})).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. No connection found for: unknown"}"#);
    assert!(server.db.find_active().await.unwrap().is_none());
    server.finish().await;
}

#[actix_web::test]
async fn malformed_connect_body_is_rejected() {
    let server = TestServer::new().await;
    let (code, _) = server.post_json("/api/connect", json!({"user": "alice"})).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    server.finish().await;
}
