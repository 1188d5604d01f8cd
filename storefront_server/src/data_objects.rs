use serde::{Deserialize, Serialize};
use storefront_engine::{db_types::OrderStatus, settlement_objects::SettlementOutcome};

/// Query parameters for the buyer's order list, e.g. `?status=PROCESSING`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// The body returned to the payment gateway once a notification has been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

impl From<&SettlementOutcome> for WebhookAck {
    fn from(outcome: &SettlementOutcome) -> Self {
        let order_number = match outcome {
            SettlementOutcome::Settled { order, .. } | SettlementOutcome::AlreadySettled { order } => {
                Some(order.order_number.clone())
            },
            SettlementOutcome::Ignored { .. } => None,
        };
        Self { status: outcome.status().to_string(), order_number }
    }
}
