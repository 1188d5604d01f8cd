use serde::Serialize;

use crate::db_types::{Order, SettlementDiscrepancy};

/// Published once per order, by whichever settlement attempt completes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// An order line could not be taken out of stock during settlement and needs manual reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementDiscrepancyEvent {
    pub order_number: String,
    pub discrepancy: SettlementDiscrepancy,
}

impl SettlementDiscrepancyEvent {
    pub fn new(order_number: String, discrepancy: SettlementDiscrepancy) -> Self {
        Self { order_number, discrepancy }
    }
}
