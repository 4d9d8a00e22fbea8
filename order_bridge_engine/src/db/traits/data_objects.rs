use crate::db_types::Order;

/// The outcome of a conditional order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order did not exist and was stored by this call
    Inserted(Order),
    /// An order with the same external id was already stored. The stored record is returned untouched.
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Inserted(o) | Self::AlreadyExists(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Inserted(o) | Self::AlreadyExists(o) => o,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}
