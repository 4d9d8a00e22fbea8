//! Order Bridge Engine
//!
//! The Order Bridge Engine connects an automated merchant-partner web session to a local order store. This library
//! contains the core logic of the bridge. It is agnostic of the browser automation that produces the order events and
//! of the HTTP layer that exposes the results.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. The data types stored in the
//!    database are defined in the `db_types` module and are public.
//! 2. The public API ([`mod@obe_api`]). This provides the session lifecycle manager, the order ingestion pipeline and
//!    the read-only order queries. Backends need to implement the traits in [`mod@db`] in order to be used by the
//!    APIs.
//!
//! Newly ingested orders are reported to a single registered listener (see [`events`]). The listener is invoked once,
//! and only once, per external order id.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod obe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{BridgeDatabase, ConnectionManagement, InsertOrderResult, OrderManagement};
pub use obe_api::{
    driver::{AutomationDriver, DriverError, SessionFileDriver},
    errors::{IngestError, OrderQueryError, SessionError},
    ingestion_api::{IngestOutcome, OrderIngestionApi},
    orders_api::OrdersApi,
    session_api::{SessionManager, SessionState},
};
