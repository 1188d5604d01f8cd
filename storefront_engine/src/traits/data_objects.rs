use serde::{Deserialize, Serialize};

use crate::db_types::Kobo;

/// Outcome of committing an order line's stock during settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCommit {
    /// Stock was taken out of inventory by this call. `remaining` is the SKU's stock afterwards.
    Committed { remaining: i64 },
    /// An earlier settlement attempt already committed this line.
    AlreadyCommitted,
}

/// Everything the payment gateway needs to open a transaction for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: i64,
    pub order_number: String,
    pub email: String,
    pub amount: Kobo,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// The reference the gateway will echo back in its settlement notification
    pub reference: String,
    /// The hosted checkout page the shopper must be sent to
    pub authorization_url: String,
}
