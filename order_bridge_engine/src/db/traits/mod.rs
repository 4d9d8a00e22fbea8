//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the bridge database *backends*.
//!
//! ## Traits
//!
//! * [`BridgeDatabase`] defines the highest level of behaviour for backends supporting the Order Bridge Engine.
//! * [`OrderManagement`] defines the durable, keyed order record store. Orders are keyed by their external
//!   (partner-assigned) order id.
//! * [`ConnectionManagement`] defines the connection session store. One record is kept per principal, and at most one
//!   record carries the `active` flag.
mod bridge_database;
mod connection_management;
mod order_management;

mod data_objects;

pub use bridge_database::BridgeDatabase;
pub use connection_management::ConnectionManagement;
pub use data_objects::InsertOrderResult;
pub use order_management::OrderManagement;
