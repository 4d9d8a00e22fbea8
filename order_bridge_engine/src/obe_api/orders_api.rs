use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::OrderManagement,
    db_types::{Order, OrderId},
    obe_api::errors::OrderQueryError,
};

/// Read-only access to the stored orders, for display and reporting.
pub struct OrdersApi<B> {
    db: B,
}

impl<B> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi")
    }
}

impl<B> OrdersApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    /// All orders, most recently observed first.
    pub async fn list_all(&self) -> Result<Vec<Order>, OrderQueryError> {
        let orders = self.db.list_all_by_observed_at_desc().await.map_err(db_error)?;
        trace!("📦️ Fetched {} orders", orders.len());
        Ok(orders)
    }

    pub async fn count(&self) -> Result<i64, OrderQueryError> {
        self.db.count().await.map_err(db_error)
    }

    pub async fn order_by_external_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        self.db.find_by_external_id(order_id).await.map_err(db_error)
    }

    pub async fn order_exists(&self, order_id: &OrderId) -> Result<bool, OrderQueryError> {
        self.db.exists_by_external_id(order_id).await.map_err(db_error)
    }
}

fn db_error<E: std::error::Error>(e: E) -> OrderQueryError {
    error!("📦️ Order query failed. {e}");
    OrderQueryError::DatabaseError(e.to_string())
}
