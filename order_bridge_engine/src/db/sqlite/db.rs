use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{connections, db_url, new_pool, orders, SqliteDatabaseError};
use crate::{
    db::traits::{BridgeDatabase, ConnectionManagement, InsertOrderResult, OrderManagement},
    db_types::{ConnectionSession, NewConnectionSession, NewOrder, Order, OrderId},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `OBS_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations. This is idempotent.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }
}

impl BridgeDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn exists_by_external_id(&self, order_id: &OrderId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::order_exists(order_id, &mut conn).await
    }

    async fn find_by_external_id(&self, order_id: &OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_external_id(order_id, &mut conn).await
    }

    async fn insert_if_absent(&self, order_id: &OrderId, order: &NewOrder) -> Result<InsertOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order_id, order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn list_all_by_observed_at_desc(&self) -> Result<Vec<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_all_orders_desc(&mut conn).await
    }

    async fn count(&self) -> Result<i64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::count_orders(&mut conn).await
    }
}

impl ConnectionManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn find_by_principal(&self, principal: &str) -> Result<Option<ConnectionSession>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        connections::fetch_session_for_principal(principal, &mut conn).await
    }

    async fn find_active(&self) -> Result<Option<ConnectionSession>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        connections::fetch_active_session(&mut conn).await
    }

    /// Deactivating the other principals and storing this session happen in one transaction, so concurrent connects
    /// can never leave two active sessions behind.
    async fn upsert(&self, session: NewConnectionSession) -> Result<ConnectionSession, Self::Error> {
        let mut tx = self.pool.begin().await?;
        if session.active {
            connections::deactivate_others(&session.principal, &mut tx).await?;
        }
        let stored = connections::upsert_session(&session, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Session for {} saved (active: {})", stored.principal, stored.active);
        Ok(stored)
    }
}
