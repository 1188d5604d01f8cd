use serde::{Deserialize, Serialize};

use crate::db_types::{Kobo, Order, OrderLine, SettlementDiscrepancy, ShippingInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub sku_id: i64,
    pub quantity: i64,
}

/// A checkout request, as submitted for both the price preview and order creation. Prices are never part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub shipping_info: ShippingInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_code: Option<String>,
    #[serde(default)]
    pub use_wallet_balance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: i64,
    pub order_number: String,
    pub total: Kobo,
    /// Where to send the buyer to pay. `None` when the wallet covered the whole order.
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub order_id: i64,
    pub order_number: String,
    pub reference: String,
    pub payment_url: String,
}

/// What [`retry_payment`](crate::OrderFlowApi::retry_payment) did for an unsettled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentRetry {
    /// A fresh gateway transaction was opened.
    Link(PaymentLink),
    /// The wallet covers the order, so its interrupted settlement was run to completion instead.
    Settled(OrderCreated),
}

impl PaymentRetry {
    pub fn into_link(self) -> Option<PaymentLink> {
        match self {
            Self::Link(link) => Some(link),
            Self::Settled(_) => None,
        }
    }
}

/// An order together with everything that was recorded alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub shipping_info: Option<ShippingInfo>,
    pub discrepancies: Vec<SettlementDiscrepancy>,
}
