use actix_web::{http::StatusCode, test::TestRequest};
use storefront_engine::order_objects::OrderCreated;

use super::{
    helpers::{authorized, charge_notification, send, TestShop, WEBHOOK_SECRET},
    mocks::accepting_gateway,
};
use crate::{data_objects::WebhookAck, routes::PAYSTACK_SIGNATURE_HEADER};

async fn place_order(shop: &TestShop) -> (OrderCreated, String) {
    let state = shop.state(accepting_gateway());
    let req =
        authorized(TestRequest::post().uri("/api/orders"), shop.buyer_id).set_json(shop.checkout(2, Some("TUNDE")));
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let created: OrderCreated = serde_json::from_str(&body).unwrap();
    let url = created.payment_url.clone().unwrap();
    let reference = url.rsplit('/').next().unwrap().to_string();
    (created, reference)
}

#[actix_web::test]
async fn charge_success_settles_the_order_once() {
    let shop = TestShop::new().await;
    let (order, reference) = place_order(&shop).await;
    let state = shop.state(accepting_gateway());

    let req = charge_notification(order.order_id, &reference, order.total, WEBHOOK_SECRET);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    let ack: WebhookAck = serde_json::from_str(&body).unwrap();
    assert_eq!(ack.status, "settled");
    assert_eq!(ack.order_number.as_deref(), Some(order.order_number.as_str()));
    assert_eq!(shop.stock().await, 3);

    let req = charge_notification(order.order_id, &reference, order.total, WEBHOOK_SECRET);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    let ack: WebhookAck = serde_json::from_str(&body).unwrap();
    assert_eq!(ack.status, "already_settled");
    assert_eq!(shop.stock().await, 3);

    // Two 2kg tubs earn the affiliate ₦500 per kg
    let req = authorized(TestRequest::get().uri("/api/affiliate/dashboard"), shop.affiliate_id);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    let dashboard: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(dashboard["referral_count"], 1);
    assert_eq!(dashboard["total_commission"], 200_000);
    shop.tear_down().await;
}

#[actix_web::test]
async fn bad_signatures_are_unauthorized() {
    let shop = TestShop::new().await;
    let (order, reference) = place_order(&shop).await;
    let state = shop.state(accepting_gateway());

    let req = charge_notification(order.order_id, &reference, order.total, "sk_test_someone_else");
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Notification signature is missing or invalid."}"#);

    let req = TestRequest::post().uri("/webhook/paystack").set_payload(r#"{"event":"charge.success","data":{}}"#);
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(shop.stock().await, 5);
    shop.tear_down().await;
}

#[actix_web::test]
async fn unknown_references_are_not_found() {
    let shop = TestShop::new().await;
    let (order, _) = place_order(&shop).await;
    let state = shop.state(accepting_gateway());
    let req = charge_notification(order.order_id, "MEL-000000-FORGED", order.total, WEBHOOK_SECRET);
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(shop.stock().await, 5);
    shop.tear_down().await;
}

#[actix_web::test]
async fn other_events_are_acknowledged() {
    let shop = TestShop::new().await;
    let state = shop.state(accepting_gateway());
    let body = r#"{"event":"transfer.success","data":{"reference":"TRF-1"}}"#;
    let signature = storefront_engine::helpers::calculate_webhook_signature(WEBHOOK_SECRET, body.as_bytes());
    let req = TestRequest::post()
        .uri("/webhook/paystack")
        .insert_header((PAYSTACK_SIGNATURE_HEADER, signature))
        .set_payload(body);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ignored"}"#);
    shop.tear_down().await;
}

#[actix_web::test]
async fn order_list_filters_by_status() {
    let shop = TestShop::new().await;
    let (paid, reference) = place_order(&shop).await;
    let (pending, _) = place_order(&shop).await;
    let state = shop.state(accepting_gateway());
    let req = charge_notification(paid.order_id, &reference, paid.total, WEBHOOK_SECRET);
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);

    let ids = |body: &str| {
        let orders: Vec<serde_json::Value> = serde_json::from_str(body).unwrap();
        orders.iter().map(|o| o["id"].as_i64().unwrap()).collect::<Vec<_>>()
    };
    let req = authorized(TestRequest::get().uri("/api/orders?status=PROCESSING"), shop.buyer_id);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(ids(&body), vec![paid.order_id]);
    let req = authorized(TestRequest::get().uri("/api/orders?status=PENDING"), shop.buyer_id);
    let (_, body) = send(&state, req).await;
    assert_eq!(ids(&body), vec![pending.order_id]);
    let req = authorized(TestRequest::get().uri("/api/orders"), shop.buyer_id);
    let (_, body) = send(&state, req).await;
    assert_eq!(ids(&body), vec![pending.order_id, paid.order_id]);

    let req = authorized(TestRequest::get().uri("/api/orders?status=LOST"), shop.buyer_id);
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    shop.tear_down().await;
}
