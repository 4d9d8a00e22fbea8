//! Single-subscriber order notifications
//!
//! The ingestion pipeline reports every newly stored order to one listener. There is no fan-out: registering a new
//! listener replaces the old one (last writer wins).
mod event_types;
mod listener;

pub use event_types::OrderCreatedEvent;
pub use listener::{listener_from_fn, ListenerError, ListenerSlot, OrderListener};
