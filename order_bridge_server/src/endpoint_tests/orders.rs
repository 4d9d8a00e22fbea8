use actix_web::http::StatusCode;
use order_bridge_engine::db_types::Order;
use serde_json::Value;

use super::helpers::TestServer;
use crate::data_objects::IngestResponse;

const ZMT_100: &str = r#"{"orderId":"ZMT-100","customerName":"Jane","totalAmount":"350.75","status":"NEW"}"#;

#[actix_web::test]
async fn health() {
    let server = TestServer::new().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    server.finish().await;
}

#[actix_web::test]
async fn ingest_then_fetch() {
    let server = TestServer::new().await;
    let (status, body) = server.post_text("/api/ingest", ZMT_100).await;
    assert_eq!(status, StatusCode::OK);
    let response: IngestResponse = serde_json::from_str(&body).expect("Invalid ingest response");
    assert_eq!(response.outcome, "created");
    let order = response.order.expect("No order in response");
    assert_eq!(order.external_order_id.as_str(), "ZMT-100");
    assert_eq!(order.customer_name.as_deref(), Some("Jane"));
    assert_eq!(order.total_amount.map(|a| a.to_string()), Some("350.75".to_string()));
    assert_eq!(order.raw_payload, ZMT_100);

    let (status, body) = server.get("/api/orders/ZMT-100").await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched, order);

    let (status, body) = server.get("/api/orders").await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders, vec![order]);
    server.finish().await;
}

#[actix_web::test]
async fn duplicate_events_are_reported() {
    let server = TestServer::new().await;
    server.post_text("/api/ingest", ZMT_100).await;
    let (status, body) =
        server.post_text("/api/ingest", r#"{"orderId":"ZMT-100","customerName":"Someone else"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let response: IngestResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.outcome, "duplicate");
    assert_eq!(response.order.unwrap().customer_name.as_deref(), Some("Jane"));

    let (_, body) = server.get("/api/status").await;
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["order_count"], 1);
    server.finish().await;
}

#[actix_web::test]
async fn unusable_events_are_dropped() {
    let server = TestServer::new().await;
    for payload in ["", r#"{"customerName":"Jane"}"#] {
        let (status, body) = server.post_text("/api/ingest", payload).await;
        assert_eq!(status, StatusCode::OK);
        let response: IngestResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.outcome, "dropped");
        assert!(response.reason.is_some());
        assert!(response.order.is_none());
    }
    let (_, body) = server.get("/api/orders").await;
    assert_eq!(body, "[]");
    server.finish().await;
}

#[actix_web::test]
async fn unknown_order_is_not_found() {
    let server = TestServer::new().await;
    let (status, body) = server.get("/api/orders/NOPE-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #NOPE-1 does not exist"}"#);
    server.finish().await;
}
