use thiserror::Error;

use crate::traits::{PaymentRequest, PaymentSession};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Timeouts, connection failures and gateway-side faults. The same request may succeed later.
    #[error("The payment gateway is unavailable. {0}")]
    Unavailable(String),
    /// The gateway refused the request on its merits (bad key, duplicate reference, invalid amount).
    #[error("The payment gateway rejected the request. {0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// An external payment processor that can open a card transaction for an order.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Opens a transaction for `request.amount`. The returned session reference must be stored on the order, since
    /// the gateway's settlement notification is matched against it.
    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError>;
}
