use mockall::mock;
use storefront_engine::traits::{GatewayError, PaymentGateway, PaymentRequest, PaymentSession};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError>;
    }
}

/// A gateway that opens a session for every request, echoing the reference it was given.
pub fn accepting_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_payment().returning(|req| {
        Ok(PaymentSession {
            authorization_url: format!("https://checkout.paystack.com/{}", req.reference),
            reference: req.reference,
        })
    });
    gateway
}

/// A gateway that times out on every request.
pub fn unavailable_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_payment()
        .returning(|_| Err(GatewayError::Unavailable("connection timed out".to_string())));
    gateway
}

/// A gateway that must never be called.
pub fn unused_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_payment().never();
    gateway
}
