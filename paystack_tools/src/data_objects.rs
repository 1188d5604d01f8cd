use serde::{Deserialize, Serialize};
use sf_common::Kobo;

/// Every Paystack response is wrapped in this envelope. `data` is absent when `status` is false.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionMetadata {
    pub order_id: i64,
    pub order_number: String,
}

/// Request body for `POST /transaction/initialize`.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Amount in kobo, Paystack's native unit for NGN
    pub amount: Kobo,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TransactionAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}
