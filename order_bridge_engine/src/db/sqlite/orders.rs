use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertOrderResult},
    db_types::{NewOrder, Order, OrderId},
};

const ORDER_COLUMNS: &str = "id, external_order_id, customer_name, total_amount, status, observed_at, raw_payload";

/// Stores the order unless one with the same external id already exists.
///
/// The existence check and the insert are a single statement, so concurrent callers cannot both insert the same id.
/// The caller that loses the race receives the stored record in [`InsertOrderResult::AlreadyExists`].
///
/// The statement is stepped to completion before returning. Run this inside a transaction and commit it before
/// reporting the order as inserted.
pub async fn idempotent_insert(
    order_id: &OrderId,
    order: &NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    let sql = format!(
        r#"
            INSERT INTO orders (
                external_order_id,
                customer_name,
                total_amount,
                status,
                observed_at,
                raw_payload
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_order_id) DO NOTHING
            RETURNING {ORDER_COLUMNS};
        "#
    );
    let inserted = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id.as_str())
        .bind(order.customer_name.as_deref())
        .bind(order.total_amount.map(|d| d.to_string()))
        .bind(order.status.as_deref())
        .bind(order.observed_at)
        .bind(order.raw_payload.as_str())
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next();
    match inserted {
        Some(order) => {
            debug!("🗃️ Order {} has been saved in the DB with id {}", order.external_order_id, order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        None => {
            trace!("🗃️ Order {order_id} already exists. Fetching the stored record");
            let existing = fetch_order_by_external_id(order_id, conn).await?.ok_or_else(|| {
                SqliteDatabaseError::QueryError(format!("Order {order_id} conflicted on insert, but was not found"))
            })?;
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
    }
}

/// Returns the order for the corresponding external `order_id`
pub async fn fetch_order_by_external_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE external_order_id = $1 LIMIT 1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Checks whether the order with the given `OrderId` already exists in the database.
pub async fn order_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE external_order_id = $1")
        .bind(order_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(matches > 0)
}

/// Fetches all orders. Resulting orders are sorted by `observed_at` in descending order, with the insertion order
/// breaking ties.
pub async fn fetch_all_orders_desc(conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY observed_at DESC, id DESC");
    trace!("🗃️ Executing query: {sql}");
    let orders = sqlx::query_as::<_, Order>(&sql).fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_all_orders_desc: {}", orders.len());
    Ok(orders)
}

pub async fn count_orders(conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(conn).await?;
    Ok(count)
}
