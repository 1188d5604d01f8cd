use log::*;
use paystack_tools::{InitializeTransaction, PaystackApi, PaystackApiError, TransactionMetadata};
use storefront_engine::traits::{GatewayError, PaymentGateway, PaymentRequest, PaymentSession};

/// Opens card payments with Paystack on behalf of the order flow.
#[derive(Clone)]
pub struct PaystackGateway(PaystackApi);

impl PaystackGateway {
    pub fn new(api: PaystackApi) -> Self {
        Self(api)
    }
}

impl PaymentGateway for PaystackGateway {
    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError> {
        let PaymentRequest { order_id, order_number, email, amount, reference } = request;
        let transaction = InitializeTransaction {
            email,
            amount,
            reference,
            callback_url: self.0.config().callback_url.clone(),
            metadata: TransactionMetadata { order_id, order_number },
        };
        let auth = self.0.initialize_transaction(transaction).await.map_err(gateway_error)?;
        Ok(PaymentSession { reference: auth.reference, authorization_url: auth.authorization_url })
    }
}

fn gateway_error(e: PaystackApiError) -> GatewayError {
    if e.is_retryable() {
        warn!("💻️ Paystack is unavailable. {e}");
        GatewayError::Unavailable(e.to_string())
    } else {
        error!("💻️ Paystack rejected a payment request. {e}");
        GatewayError::Rejected(e.to_string())
    }
}
