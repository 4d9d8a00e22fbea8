use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{ConnectionSession, NewConnectionSession},
};

const SESSION_COLUMNS: &str = "id, principal, session_token, active, activated_at, created_at, updated_at";

pub async fn fetch_session_for_principal(
    principal: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ConnectionSession>, SqliteDatabaseError> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM connection_sessions WHERE principal = $1");
    let session = sqlx::query_as::<_, ConnectionSession>(&sql).bind(principal).fetch_optional(conn).await?;
    Ok(session)
}

pub async fn fetch_active_session(
    conn: &mut SqliteConnection,
) -> Result<Option<ConnectionSession>, SqliteDatabaseError> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM connection_sessions WHERE active = 1 LIMIT 1");
    let session = sqlx::query_as::<_, ConnectionSession>(&sql).fetch_optional(conn).await?;
    Ok(session)
}

/// Marks every active session that does not belong to `principal` as inactive. Returns the number of sessions that
/// were deactivated.
///
/// This is not atomic on its own. Embed the call in a transaction together with [`upsert_session`].
pub async fn deactivate_others(principal: &str, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE connection_sessions SET active = 0, updated_at = CURRENT_TIMESTAMP WHERE active = 1 AND principal <> $1",
    )
    .bind(principal)
    .execute(conn)
    .await?;
    let n = result.rows_affected();
    if n > 0 {
        debug!("🗃️ {n} active session(s) were deactivated in favour of {principal}");
    }
    Ok(n)
}

/// Inserts the session for the principal, or overwrites the token, active flag and activation time of the existing
/// record.
pub async fn upsert_session(
    session: &NewConnectionSession,
    conn: &mut SqliteConnection,
) -> Result<ConnectionSession, SqliteDatabaseError> {
    let sql = format!(
        r#"
            INSERT INTO connection_sessions (principal, session_token, active, activated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (principal) DO UPDATE SET
                session_token = excluded.session_token,
                active = excluded.active,
                activated_at = excluded.activated_at,
                updated_at = CURRENT_TIMESTAMP
            RETURNING {SESSION_COLUMNS};
        "#
    );
    let stored = sqlx::query_as::<_, ConnectionSession>(&sql)
        .bind(session.principal.as_str())
        .bind(session.session_token.as_str())
        .bind(session.active)
        .bind(session.activated_at)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    trace!("🗃️ Session for {} stored. Active: {}", stored.principal, stored.active);
    Ok(stored)
}
