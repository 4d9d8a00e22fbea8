use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The upstream partner's identifier for an order. This is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
/// A merchant order as observed on the partner feed and stored by the bridge.
///
/// Orders are created exactly once, at first successful ingestion, and are never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identity
    pub id: i64,
    pub external_order_id: OrderId,
    pub customer_name: Option<String>,
    pub total_amount: Option<Decimal>,
    /// Free-form status label as reported by the partner feed
    pub status: Option<String>,
    /// The time the bridge ingested the order. This is not the upstream event time.
    pub observed_at: DateTime<Utc>,
    /// The unmodified event payload, kept for forensic replay
    pub raw_payload: String,
}

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let total_amount = row
            .try_get::<Option<String>, _>("total_amount")?
            .map(|s| Decimal::from_str(&s))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "total_amount".into(), source: Box::new(e) })?;
        Ok(Self {
            id: row.try_get("id")?,
            external_order_id: row.try_get("external_order_id")?,
            customer_name: row.try_get("customer_name")?,
            total_amount,
            status: row.try_get("status")?,
            observed_at: row.try_get("observed_at")?,
            raw_payload: row.try_get("raw_payload")?,
        })
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// The best-effort result of parsing an order event payload, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// The order id as assigned by the partner. A payload that does not carry one cannot be stored.
    pub external_order_id: Option<OrderId>,
    pub customer_name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub raw_payload: String,
}

impl NewOrder {
    pub fn new<S: Into<String>>(raw_payload: S) -> Self {
        Self {
            external_order_id: None,
            customer_name: None,
            total_amount: None,
            status: None,
            observed_at: Utc::now(),
            raw_payload: raw_payload.into(),
        }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.external_order_id = Some(order_id);
        self
    }

    pub fn with_customer_name<S: Into<String>>(mut self, name: S) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_total_amount(mut self, amount: Decimal) -> Self {
        self.total_amount = Some(amount);
        self
    }

    pub fn with_status<S: Into<String>>(mut self, status: S) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Checks whether the stored order was created from this parse result.
    pub fn is_equivalent(&self, order: &Order) -> bool {
        self.external_order_id.as_ref() == Some(&order.external_order_id) &&
            self.customer_name == order.customer_name &&
            self.total_amount == order.total_amount &&
            self.status == order.status &&
            self.raw_payload == order.raw_payload
    }
}

//--------------------------------------   ConnectionSession   ---------------------------------------------------------
/// A principal's automation session with the partner portal.
///
/// At most one session in the store is `active` at any time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ConnectionSession {
    pub id: i64,
    /// The account name that the session was established for
    pub principal: String,
    /// Opaque reference to the persisted browser session artifact
    pub session_token: String,
    pub active: bool,
    pub activated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//-------------------------------------- NewConnectionSession ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnectionSession {
    pub principal: String,
    pub session_token: String,
    pub active: bool,
    pub activated_at: DateTime<Utc>,
}

impl NewConnectionSession {
    /// A freshly activated session for `principal`
    pub fn activated<P: Into<String>, T: Into<String>>(principal: P, session_token: T) -> Self {
        Self { principal: principal.into(), session_token: session_token.into(), active: true, activated_at: Utc::now() }
    }
}

impl From<ConnectionSession> for NewConnectionSession {
    fn from(session: ConnectionSession) -> Self {
        Self {
            principal: session.principal,
            session_token: session.session_token,
            active: session.active,
            activated_at: session.activated_at,
        }
    }
}
