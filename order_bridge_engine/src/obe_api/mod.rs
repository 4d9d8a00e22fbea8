//! # Order bridge public API
//!
//! The `obe_api` module exposes the programmatic API of the Order Bridge Engine.
//!
//! * [`session_api`] manages the automation session lifecycle: connecting and disconnecting principals, the in-memory
//!   listening flag, and wiring the order listener.
//! * [`ingestion_api`] turns raw order event payloads into stored orders, exactly once per external order id.
//! * [`orders_api`] provides read-only queries over the stored orders.
//! * [`driver`] defines the contract for the external browser automation.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the API.
//!
//! ```rust,ignore
//! use order_bridge_engine::{SessionFileDriver, SessionManager, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/order_bridge.db", 5).await?;
//! let manager = SessionManager::new(db, SessionFileDriver::default());
//! let token = manager.connect("merchant@example.com", &password).await?;
//! manager.start_listening();
//! let outcome = manager.ingestion().ingest(Some(payload)).await?;
//! ```
pub mod driver;
pub mod errors;
pub mod ingestion_api;
pub mod orders_api;
pub mod session_api;
