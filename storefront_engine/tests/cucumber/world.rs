use std::collections::HashMap;

use cucumber::World;
use log::*;
use sf_common::Secret;
use storefront_engine::{
    events::EventProducers,
    order_objects::OrderCreated,
    settlement_objects::SettlementOutcome,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{GatewayError, PaymentGateway, PaymentRequest, PaymentSession},
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
    StorefrontError,
};

pub const WEBHOOK_SECRET: &str = "sk_test_cucumber";

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<StorefrontSystem>,
    /// Users by their nickname in the feature file
    pub users: HashMap<String, i64>,
    /// SKUs by size label
    pub skus: HashMap<String, i64>,
    pub last_order: Option<OrderCreated>,
    pub last_error: Option<StorefrontError>,
    pub last_outcome: Option<Result<SettlementOutcome, StorefrontError>>,
}

#[derive(Debug)]
pub struct StorefrontSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase, CheckoutPage>,
    pub settlement: SettlementApi<SqliteDatabase>,
}

impl StorefrontWorld {
    pub fn system(&self) -> &StorefrontSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.system().db
    }

    pub fn user(&self, name: &str) -> i64 {
        *self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn sku(&self, label: &str) -> i64 {
        *self.skus.get(label).unwrap_or_else(|| panic!("No SKU labelled {label}"))
    }

    pub fn last_order(&self) -> &OrderCreated {
        self.last_order.as_ref().expect("No order has been placed")
    }
}

impl StorefrontSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("Created database: {db_path}");
        let producers = EventProducers::default();
        let orders = OrderFlowApi::new(db.clone(), CheckoutPage, producers.clone());
        let settlement = SettlementApi::new(db.clone(), producers, Secret::new(WEBHOOK_SECRET.to_string()));
        Self { db_path, db, orders, settlement }
    }
}

/// Hands out a hosted checkout page for every payment request.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutPage;

impl PaymentGateway for CheckoutPage {
    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError> {
        Ok(PaymentSession {
            authorization_url: format!("https://checkout.example.com/{}", request.reference),
            reference: request.reference,
        })
    }
}
