use crate::db_types::{ConnectionSession, NewConnectionSession};

/// The `ConnectionManagement` trait defines the behaviour of the connection session store.
///
/// There is one record per principal. At most one record in the store is active at any given time.
#[allow(async_fn_in_trait)]
pub trait ConnectionManagement {
    type Error: std::error::Error;

    /// Fetches the session record for the given principal, if one exists.
    async fn find_by_principal(&self, principal: &str) -> Result<Option<ConnectionSession>, Self::Error>;

    /// Fetches the single active session record, if there is one.
    async fn find_active(&self) -> Result<Option<ConnectionSession>, Self::Error>;

    /// Creates the session record for `session.principal`, or overwrites the existing one.
    ///
    /// If the upserted session is active, any other principal's active session is deactivated in the same atomic
    /// operation (last connect wins).
    async fn upsert(&self, session: NewConnectionSession) -> Result<ConnectionSession, Self::Error>;
}
