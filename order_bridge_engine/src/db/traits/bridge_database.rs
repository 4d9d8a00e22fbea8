use crate::db::traits::{ConnectionManagement, OrderManagement};

/// This trait defines the highest level of behaviour for backends supporting the Order Bridge Engine.
///
/// A bridge backend stores both the order records and the connection sessions.
#[allow(async_fn_in_trait)]
pub trait BridgeDatabase: OrderManagement + ConnectionManagement + Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) {}
}
