use std::{fmt::Debug, str::FromStr};

use log::*;
use rust_decimal::Decimal;

use crate::{
    db::traits::{InsertOrderResult, OrderManagement},
    db_types::{NewOrder, Order, OrderId},
    events::{ListenerSlot, OrderCreatedEvent, OrderListener},
    helpers::extract_field,
    obe_api::errors::IngestError,
};

/// The result of pushing one order event through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The order was seen for the first time and stored. The listener has been notified.
    Created(Order),
    /// An order with the same external id was stored earlier. That record is returned unchanged, and the listener is
    /// not notified again.
    Duplicate(Order),
    /// The event could not be turned into an order and was discarded.
    Dropped(IngestError),
}

impl IngestOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Created(o) | Self::Duplicate(o) => Some(o),
            Self::Dropped(_) => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Parses a raw order event payload into a [`NewOrder`].
///
/// Only a structurally absent payload (`None`) is an error. Anything else produces a best-effort
/// order, where every field that could not be extracted is `None`. `observed_at` is set to the current time.
pub fn parse_order(raw_payload: Option<&str>) -> Result<NewOrder, IngestError> {
    let raw = raw_payload.ok_or_else(|| IngestError::MalformedPayload("No payload was supplied".into()))?;
    let mut order = NewOrder::new(raw);
    order.external_order_id = extract_field(raw, "orderId").filter(|s| !s.is_empty()).map(OrderId::from);
    order.customer_name = extract_field(raw, "customerName").map(String::from);
    order.total_amount = extract_field(raw, "totalAmount").and_then(|amount| match Decimal::from_str(amount) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!("📦️ Ignoring totalAmount '{amount}', since it is not a valid decimal. {e}");
            None
        },
    });
    order.status = extract_field(raw, "status").map(String::from);
    trace!("📦️ Parsed order payload: {order:?}");
    Ok(order)
}

/// `OrderIngestionApi` turns raw order events into stored orders.
///
/// Every external order id is stored at most once, and the registered listener hears about it at most once, even
/// when the same event is delivered concurrently.
pub struct OrderIngestionApi<B> {
    db: B,
    listener: ListenerSlot,
}

impl<B> Debug for OrderIngestionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderIngestionApi")
    }
}

impl<B> OrderIngestionApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, listener: ListenerSlot::new() }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Installs the order listener, replacing the current one. Returns true if a listener was replaced.
    pub fn register_listener(&self, listener: OrderListener) -> bool {
        self.listener.replace(listener)
    }

    pub fn clear_listener(&self) -> bool {
        self.listener.clear()
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_registered()
    }

    pub fn parse(&self, raw_payload: Option<&str>) -> Result<NewOrder, IngestError> {
        parse_order(raw_payload)
    }
}

impl<B> OrderIngestionApi<B>
where B: OrderManagement
{
    /// Parses the payload, stores the order if its external id has not been seen before, and notifies the listener.
    ///
    /// Parsing problems never escalate: unusable events are reported as [`IngestOutcome::Dropped`]. The only error
    /// returned is a failure of the backing store.
    ///
    /// The listener is awaited before this method returns. A failing listener is logged, and the order remains
    /// stored.
    pub async fn ingest(&self, raw_payload: Option<&str>) -> Result<IngestOutcome, IngestError> {
        let order = match parse_order(raw_payload) {
            Ok(order) => order,
            Err(e) => {
                warn!("📦️ Order event dropped. {e}");
                return Ok(IngestOutcome::Dropped(e));
            },
        };
        let Some(order_id) = order.external_order_id.clone() else {
            let e = IngestError::MalformedPayload("The payload does not contain an orderId".into());
            warn!("📦️ Order event dropped. {e} Payload: {}", order.raw_payload);
            return Ok(IngestOutcome::Dropped(e));
        };
        let result = self.db.insert_if_absent(&order_id, &order).await.map_err(|e| {
            error!("📦️ Could not store order {order_id}. {e}");
            IngestError::DatabaseError(e.to_string())
        })?;
        match result {
            InsertOrderResult::AlreadyExists(existing) => {
                debug!("📦️ Order {order_id} has already been ingested (id {}). Ignoring the duplicate.", existing.id);
                Ok(IngestOutcome::Duplicate(existing))
            },
            InsertOrderResult::Inserted(order) => {
                info!("📦️ New order {order_id} stored with id {}", order.id);
                self.notify_listener(&order).await;
                Ok(IngestOutcome::Created(order))
            },
        }
    }

    async fn notify_listener(&self, order: &Order) {
        let event = OrderCreatedEvent::new(order.clone());
        match self.listener.notify(event).await {
            Ok(true) => trace!("📦️ Listener notified of order {}", order.external_order_id),
            Ok(false) => debug!("📦️ Order {} stored, but no listener is registered", order.external_order_id),
            Err(e) => warn!("📦️ Order {} is stored, but the listener failed. {e}", order.external_order_id),
        }
    }
}
