use crate::db_types::{NewOrder, Order, OrderId};
use crate::db::traits::InsertOrderResult;

/// The `OrderManagement` trait defines the behaviour of the order record store.
///
/// Orders are keyed by their external order id, which is unique across the store. Orders are never updated or
/// deleted through this interface.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    type Error: std::error::Error;

    /// Checks whether an order with the given external id has been stored.
    async fn exists_by_external_id(&self, order_id: &OrderId) -> Result<bool, Self::Error>;

    /// Fetches the order with the given external id, if it exists.
    async fn find_by_external_id(&self, order_id: &OrderId) -> Result<Option<Order>, Self::Error>;

    /// Atomically stores `order` under `order_id`, unless an order with that id already exists.
    ///
    /// Implementations MUST guarantee that when several callers race on the same id, exactly one of them receives
    /// [`InsertOrderResult::Inserted`]. Every other caller receives [`InsertOrderResult::AlreadyExists`] along with
    /// the record that won. The losing payloads are discarded; the stored record is never modified.
    async fn insert_if_absent(&self, order_id: &OrderId, order: &NewOrder) -> Result<InsertOrderResult, Self::Error>;

    /// Returns all stored orders, newest `observed_at` first.
    async fn list_all_by_observed_at_desc(&self) -> Result<Vec<Order>, Self::Error>;

    /// The number of stored orders.
    async fn count(&self) -> Result<i64, Self::Error>;
}
