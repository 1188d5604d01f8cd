use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use storefront_engine::affiliate_objects::{AffiliateCodeCheck, AffiliateRegistration};

use super::{
    helpers::{authorized, send, TestShop},
    mocks::unused_gateway,
};

#[actix_web::test]
async fn codes_are_validated_without_a_token() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let (status, body) = send(&state, TestRequest::get().uri("/affiliate/validate/tunde")).await;
    assert_eq!(status, StatusCode::OK);
    let check: AffiliateCodeCheck = serde_json::from_str(&body).unwrap();
    assert!(check.valid);
    assert_eq!(check.affiliate_name, "Tunde Bakare");

    let (status, _) = send(&state, TestRequest::get().uri("/affiliate/validate/NOBODY")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    shop.tear_down().await;
}

#[actix_web::test]
async fn registration_needs_approval() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let req = authorized(TestRequest::post().uri("/api/affiliate/register"), shop.buyer_id);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let registration: AffiliateRegistration = serde_json::from_str(&body).unwrap();
    assert!(!registration.approved);

    let uri = format!("/affiliate/validate/{}", registration.affiliate_code);
    let (status, _) = send(&state, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = authorized(TestRequest::post().uri("/api/affiliate/register"), shop.buyer_id);
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    shop.tear_down().await;
}

#[actix_web::test]
async fn withdrawals_are_checked_against_the_balance() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let req = authorized(TestRequest::post().uri("/api/affiliate/withdraw"), shop.affiliate_id)
        .set_json(json!({"amount": 100_000}));
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Insufficient wallet balance"), "{body}");

    let req = authorized(TestRequest::post().uri("/api/affiliate/withdraw"), shop.affiliate_id)
        .set_json(json!({"amount": 0}));
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req =
        authorized(TestRequest::post().uri("/api/affiliate/withdraw"), shop.buyer_id).set_json(json!({"amount": 100}));
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&state, authorized(TestRequest::get().uri("/api/wallet/audit"), shop.affiliate_id)).await;
    assert_eq!(status, StatusCode::OK);
    let audit: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(audit["balance"], 0);
    shop.tear_down().await;
}

#[actix_web::test]
async fn dashboard_shows_payout_bank_details() {
    let shop = TestShop::new().await;
    let state = shop.state(unused_gateway());
    let req = authorized(TestRequest::get().uri("/api/affiliate/dashboard"), shop.affiliate_id);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let dashboard: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(dashboard["bank_details"]["account_name"], "Tunde Bakare");
    assert_eq!(dashboard["bank_details"]["account_number"], "0123456789");
    assert_eq!(dashboard["bank_details"]["bank_name"], "First Bank");

    // A fresh affiliate has not given any bank details yet
    let req = authorized(TestRequest::post().uri("/api/affiliate/register"), shop.buyer_id);
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let req = authorized(TestRequest::get().uri("/api/affiliate/dashboard"), shop.buyer_id);
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let dashboard: Value = serde_json::from_str(&body).unwrap();
    assert!(dashboard["bank_details"].is_null());
    shop.tear_down().await;
}
