use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::Value;
use storefront_engine::order_objects::{OrderCreated, PaymentLink};

use super::{
    helpers::{authorized, issue_token_with, send, TestShop, JWT_SECRET},
    mocks::{accepting_gateway, unavailable_gateway, unused_gateway},
};

#[actix_web::test]
async fn calculate_prices_the_cart() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let req = authorized(TestRequest::post().uri("/api/checkout/calculate"), shop.buyer_id)
        .set_json(shop.checkout(1, Some("tunde")));
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    let quote: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(quote["subtotal"], 300_000);
    assert_eq!(quote["discount"], 15_000);
    assert_eq!(quote["delivery_fee"], 150_000);
    assert_eq!(quote["total"], 435_000);
    assert_eq!(quote["affiliate_code"], "TUNDE");
    assert_eq!(shop.stock().await, 5, "A quote must not touch stock");
    shop.tear_down().await;
}

#[actix_web::test]
async fn orders_need_a_bearer_token() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let req = TestRequest::post().uri("/api/orders").set_json(shop.checkout(1, None));
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No bearer token was provided."}"#);

    let forged = issue_token_with(shop.buyer_id, false, "not-the-server-secret");
    let req = TestRequest::get().uri("/api/orders").insert_header(("Authorization", format!("Bearer {forged}")));
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = issue_token_with(shop.buyer_id, true, JWT_SECRET);
    let req = TestRequest::get().uri("/api/orders").insert_header(("Authorization", format!("Bearer {admin}")));
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    shop.tear_down().await;
}

#[actix_web::test]
async fn create_order_returns_a_payment_link() {
    let shop = TestShop::new().await;
    let state = shop.state(accepting_gateway());
    let req = authorized(TestRequest::post().uri("/api/orders"), shop.buyer_id).set_json(shop.checkout(2, None));
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: OrderCreated = serde_json::from_str(&body).unwrap();
    assert_eq!(created.total.value(), 750_000);
    assert!(created.order_number.starts_with("MEL-"));
    let url = created.payment_url.expect("Card orders need a payment link");
    assert!(url.starts_with(&format!("https://checkout.paystack.com/{}-", created.order_number)));

    let req = authorized(TestRequest::get().uri("/api/orders"), shop.buyer_id);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["payment_status"], "PENDING");

    let uri = format!("/api/orders/{}", created.order_id);
    let (status, body) = send(&state, authorized(TestRequest::get().uri(&uri), shop.buyer_id)).await;
    assert_eq!(status, StatusCode::OK);
    let details: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(details["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(details["shipping_info"]["city"], "Yaba");

    // Someone else's order is reported as missing
    let (status, _) = send(&state, authorized(TestRequest::get().uri(&uri), shop.affiliate_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    shop.tear_down().await;
}

#[actix_web::test]
async fn stock_shortfall_is_a_bad_request() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let req = authorized(TestRequest::post().uri("/api/orders"), shop.buyer_id).set_json(shop.checkout(6, None));
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Requested 6, but only 5 available"), "{body}");
    let (_, body) = send(&state, authorized(TestRequest::get().uri("/api/orders"), shop.buyer_id)).await;
    assert_eq!(body, "[]");
    shop.tear_down().await;
}

#[actix_web::test]
async fn gateway_outage_keeps_the_order_for_a_retry() {
    let shop = TestShop::new().await;
    let down = shop.state(unavailable_gateway());
    let req = authorized(TestRequest::post().uri("/api/orders"), shop.buyer_id).set_json(shop.checkout(1, None));
    let (status, body) = send(&down, req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("unavailable"), "{body}");

    let (_, body) = send(&down, authorized(TestRequest::get().uri("/api/orders"), shop.buyer_id)).await;
    let orders: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    let order_id = orders[0]["id"].as_i64().unwrap();

    let up = shop.state(accepting_gateway());
    let uri = format!("/api/orders/{order_id}/pay");
    let (status, body) = send(&up, authorized(TestRequest::post().uri(&uri), shop.buyer_id)).await;
    assert_eq!(status, StatusCode::OK);
    let link: PaymentLink = serde_json::from_str(&body).unwrap();
    assert_eq!(link.order_id, order_id);
    assert!(link.reference.starts_with(&format!("{}-", link.order_number)));
    shop.tear_down().await;
}
