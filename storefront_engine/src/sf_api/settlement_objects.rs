use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    db_types::{Kobo, Order, SettlementDiscrepancy},
    sf_api::errors::StorefrontError,
};

pub const CHARGE_SUCCESS_EVENT: &str = "charge.success";

/// A parsed payment gateway notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayNotification {
    ChargeSuccess(ChargeSuccess),
    /// Any other event. These are acknowledged and otherwise ignored.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeSuccess {
    pub reference: String,
    pub order_id: i64,
    /// The amount the gateway reports having captured
    pub amount: Option<Kobo>,
}

#[derive(Deserialize)]
struct RawNotification {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct RawCharge {
    reference: String,
    #[serde(default)]
    amount: Option<Kobo>,
    metadata: RawMetadata,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(deserialize_with = "number_or_string")]
    order_id: i64,
}

/// Order ids are echoed back from the metadata we sent, but some integrations stringify metadata values.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }
    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl GatewayNotification {
    /// Parses a raw notification body. Only call this once the body's signature has been verified.
    pub fn from_body(body: &[u8]) -> Result<Self, StorefrontError> {
        let raw: RawNotification = serde_json::from_slice(body)
            .map_err(|e| StorefrontError::Validation(format!("Notification is not valid JSON. {e}")))?;
        if raw.event != CHARGE_SUCCESS_EVENT {
            return Ok(Self::Other(raw.event));
        }
        let charge: RawCharge = serde_json::from_value(raw.data)
            .map_err(|e| StorefrontError::Validation(format!("Malformed {CHARGE_SUCCESS_EVENT} notification. {e}")))?;
        Ok(Self::ChargeSuccess(ChargeSuccess {
            reference: charge.reference,
            order_id: charge.metadata.order_id,
            amount: charge.amount,
        }))
    }
}

/// What processing a notification (or settling a wallet-covered order) achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// This call finished settling the order. `discrepancies` lists lines that could not be taken out of stock.
    Settled { order: Order, discrepancies: Vec<SettlementDiscrepancy> },
    /// The order had been fully settled before. Nothing was changed.
    AlreadySettled { order: Order },
    /// The notification was not a successful charge. Nothing was changed.
    Ignored { event: String },
}

impl SettlementOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Settled { .. } => "settled",
            Self::AlreadySettled { .. } => "already_settled",
            Self::Ignored { .. } => "ignored",
        }
    }
}
