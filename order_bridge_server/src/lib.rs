//! # Order bridge server
//! This crate hosts the HTTP surface of the partner order bridge. It is responsible for:
//! Connecting and disconnecting the partner portal session on request.
//! Accepting raw order events from the automation driver and pushing them into the ingestion pipeline.
//! Serving the stored orders and the session status.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/status`: Whether a session is active, whether orders are being listened for, and the number of orders.
//! * `/api/orders`, `/api/orders/{order_id}`: The stored orders, newest first, or a single order.
//! * `/api/connect`, `/api/disconnect`: Session lifecycle.
//! * `/api/ingest`: Raw order event payloads from the automation driver.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
