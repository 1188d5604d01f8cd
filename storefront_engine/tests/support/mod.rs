#![allow(dead_code)]
//! Shared fixtures for the engine integration tests.
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use log::*;
use serde_json::json;
use sf_common::Secret;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_engine::{
    db_types::{Kobo, ShippingInfo},
    events::EventProducers,
    helpers::calculate_webhook_signature,
    order_objects::{CartItem, CheckoutRequest},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed,
    },
    traits::{GatewayError, PaymentGateway, PaymentRequest, PaymentSession},
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
};

pub const SECRET: &str = "sk_test_3f9a0c";

/// Records every payment request, and either succeeds or fails them all.
#[derive(Clone, Default)]
pub struct FakeGateway {
    calls: Arc<AtomicUsize>,
    unavailable: bool,
}

impl FakeGateway {
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for FakeGateway {
    async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(GatewayError::Unavailable("connection timed out".into()));
        }
        Ok(PaymentSession {
            authorization_url: format!("https://checkout.example.com/{}", request.reference),
            reference: request.reference,
        })
    }
}

/// A migrated database with a small catalog, a buyer and an approved affiliate.
///
/// * Black soap, 2kg tub, ₦3,000, 10 in stock. Earns ₦500 per kg.
/// * Kernel oil, 500ml, ₦2,000, 10 in stock. No commission configured.
/// * Lagos delivery is ₦1,500 (Ikeja is free), everywhere else ₦2,000. Affiliate discount is 5%.
pub struct Shop {
    pub url: String,
    pub db: SqliteDatabase,
    pub buyer_id: i64,
    pub affiliate_id: i64,
    pub soap_sku: i64,
    pub oil_sku: i64,
}

impl Shop {
    pub async fn new() -> Self {
        Self::with_buyer_balance(Kobo::default()).await
    }

    pub async fn with_buyer_balance(balance: Kobo) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let pool = db.pool();
        let buyer_id = seed::create_user(pool, "ada@example.com", "Ada Obi", balance).await;
        let affiliate_id = seed::create_affiliate(pool, "tunde@example.com", "Tunde Bakare", "TUNDE").await;
        let soap = seed::create_product(pool, "Black Soap", "BLACK_SOAP").await;
        let oil = seed::create_product(pool, "Palm Kernel Oil", "KERNEL_OIL").await;
        let soap_sku = seed::create_sku(pool, soap, "2kg", 2.0, Kobo::from_naira(3_000), 10).await;
        let oil_sku = seed::create_sku(pool, oil, "500ml", 0.5, Kobo::from_naira(2_000), 10).await;
        seed::set_discount_percentage(pool, 5.0).await;
        seed::set_delivery_fees(pool, json!({"LAGOS": {"DEFAULT": 150_000, "IKEJA": 0}})).await;
        seed::set_commission_rates(pool, json!({"BLACK_SOAP": {"amount": 50_000, "per_unit": 1.0}})).await;
        debug!("🚀️ Shop ready at {url}");
        Self { url, db, buyer_id, affiliate_id, soap_sku, oil_sku }
    }

    pub fn order_api(&self, gateway: FakeGateway) -> OrderFlowApi<SqliteDatabase, FakeGateway> {
        OrderFlowApi::new(self.db.clone(), gateway, EventProducers::default())
    }

    pub fn settlement_api(&self, producers: EventProducers) -> SettlementApi<SqliteDatabase> {
        SettlementApi::new(self.db.clone(), producers, Secret::new(SECRET.to_string()))
    }

    pub fn checkout(&self, items: &[(i64, i64)], city: &str, affiliate_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            items: items.iter().map(|&(sku_id, quantity)| CartItem { sku_id, quantity }).collect(),
            shipping_info: ShippingInfo {
                full_name: "Ada Obi".into(),
                phone: "08030000000".into(),
                email: "ada@example.com".into(),
                state: "Lagos".into(),
                city: city.into(),
                address: "1 Allen Avenue".into(),
            },
            affiliate_code: affiliate_code.map(String::from),
            use_wallet_balance: false,
        }
    }

    pub async fn stock(&self, sku_id: i64) -> i64 {
        seed::stock_of(self.db.pool(), sku_id).await
    }

    pub async fn count(&self, sql: &str, id: i64) -> i64 {
        seed::count_rows(self.db.pool(), sql, id).await
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Could not remove {}: {e}", self.url);
        }
    }
}

/// A signed `charge.success` notification body and its signature.
pub fn charge_success(order_id: i64, reference: &str, amount: Kobo) -> (Vec<u8>, String) {
    let body = json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "amount": amount,
            "status": "success",
            "metadata": {"order_id": order_id}
        }
    })
    .to_string()
    .into_bytes();
    let signature = calculate_webhook_signature(SECRET, &body);
    (body, signature)
}
