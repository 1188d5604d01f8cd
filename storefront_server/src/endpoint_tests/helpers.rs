use actix_web::{http::StatusCode, test, test::TestRequest, App};
use jsonwebtoken::{encode, EncodingKey, Header};
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
    SqliteDatabase,
};

use super::mocks::MockGateway;
use crate::{
    auth::JwtClaims,
    config::{AuthConfig, ServerConfig},
    routes::PAYSTACK_SIGNATURE_HEADER,
    server::AppState,
};

// Test-only secrets. DO NOT re-use these anywhere.
pub const JWT_SECRET: &str = "endpoint-test-jwt-secret-0b6f7e";
pub const WEBHOOK_SECRET: &str = "sk_test_endpoint_5d21";

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::new("127.0.0.1", 0);
    config.auth = AuthConfig::new(JWT_SECRET);
    config.paystack.secret_key = Secret::new(WEBHOOK_SECRET.to_string());
    config
}

pub fn issue_token(user_id: i64) -> String {
    issue_token_with(user_id, false, JWT_SECRET)
}

pub fn issue_token_with(user_id: i64, is_admin: bool, secret: &str) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as u64;
    let claims = JwtClaims { user_id, email: format!("user{user_id}@example.com"), exp, is_admin };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("Failed to sign token")
}

/// A small shop in a fresh database: a buyer, an approved affiliate (`TUNDE`) and one SKU of black soap at ₦3,000
/// with 5 in stock. Lagos delivery is ₦1,500 and the affiliate discount is 5%.
pub struct TestShop {
    pub url: String,
    pub db: SqliteDatabase,
    pub buyer_id: i64,
    pub affiliate_id: i64,
    pub sku_id: i64,
}

impl TestShop {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let pool = db.pool();
        let buyer_id = seed::create_user(pool, "ada@example.com", "Ada Obi", Kobo::default()).await;
        let affiliate_id = seed::create_affiliate(pool, "tunde@example.com", "Tunde Bakare", "TUNDE").await;
        let product = seed::create_product(pool, "Black Soap", "BLACK_SOAP").await;
        let sku_id = seed::create_sku(pool, product, "2kg", 2.0, Kobo::from_naira(3_000), 5).await;
        seed::set_discount_percentage(pool, 5.0).await;
        seed::set_delivery_fees(pool, json!({"LAGOS": {"DEFAULT": 150_000}})).await;
        seed::set_commission_rates(pool, json!({"BLACK_SOAP": {"amount": 50_000, "per_unit": 1.0}})).await;
        Self { url, db, buyer_id, affiliate_id, sku_id }
    }

    pub fn state(&self, gateway: MockGateway) -> AppState<SqliteDatabase, MockGateway> {
        AppState::new(&test_config(), self.db.clone(), gateway, EventProducers::default())
    }

    pub fn checkout(&self, quantity: i64, affiliate_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![CartItem { sku_id: self.sku_id, quantity }],
            shipping_info: ShippingInfo {
                full_name: "Ada Obi".into(),
                phone: "08030000000".into(),
                email: "ada@example.com".into(),
                state: "Lagos".into(),
                city: "Yaba".into(),
                address: "1 Herbert Macaulay Way".into(),
            },
            affiliate_code: affiliate_code.map(String::from),
            use_wallet_balance: false,
        }
    }

    pub async fn stock(&self) -> i64 {
        seed::stock_of(self.db.pool(), self.sku_id).await
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            error!("Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("Could not remove {}: {e}", self.url);
        }
    }
}

/// Sends a single request through an app built from `state`, and returns the status and body.
pub async fn send(state: &AppState<SqliteDatabase, MockGateway>, req: TestRequest) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    debug!("Response: {status} {}", String::from_utf8_lossy(&body));
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn authorized(req: TestRequest, user_id: i64) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", issue_token(user_id))))
}

/// A `charge.success` notification, signed with `secret`.
pub fn charge_notification(order_id: i64, reference: &str, amount: Kobo, secret: &str) -> TestRequest {
    let body = json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "amount": amount,
            "status": "success",
            "metadata": {"order_id": order_id}
        }
    })
    .to_string();
    let signature = calculate_webhook_signature(secret, body.as_bytes());
    TestRequest::post()
        .uri("/webhook/paystack")
        .insert_header((PAYSTACK_SIGNATURE_HEADER, signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
}
