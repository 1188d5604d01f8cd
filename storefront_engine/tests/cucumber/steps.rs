use cucumber::{given, then, when};
use serde_json::json;
use storefront_engine::{
    db_types::{Kobo, PaymentStatus, ShippingInfo},
    helpers::calculate_webhook_signature,
    order_objects::{CartItem, CheckoutRequest},
    test_utils::seed,
    traits::AccountManagement,
    StorefrontError,
};

use crate::cucumber::{
    world::{StorefrontSystem, WEBHOOK_SECRET},
    StorefrontWorld,
};

#[given("a fresh install")]
async fn fresh_install(world: &mut StorefrontWorld) {
    world.system = Some(StorefrontSystem::new().await);
}

#[given(
    expr = "a product {string} in category {word} with a {string} SKU of size {float} priced at {int} naira with {int} \
            in stock"
)]
async fn product_with_sku(
    world: &mut StorefrontWorld,
    name: String,
    category: String,
    label: String,
    size: f64,
    naira: i64,
    stock: i64,
) {
    let pool = world.db().pool();
    let product_id = seed::create_product(pool, &name, &category).await;
    let sku_id = seed::create_sku(pool, product_id, &label, size, Kobo::from_naira(naira), stock).await;
    world.skus.insert(label, sku_id);
}

#[given(expr = "the affiliate discount is {int} percent")]
async fn discount(world: &mut StorefrontWorld, percent: i64) {
    seed::set_discount_percentage(world.db().pool(), percent as f64).await;
}

#[given(expr = "delivery to {word} costs {int} naira")]
async fn delivery_fee(world: &mut StorefrontWorld, state: String, naira: i64) {
    let fees = json!({ state: { "DEFAULT": Kobo::from_naira(naira) } });
    seed::set_delivery_fees(world.db().pool(), fees).await;
}

#[given(expr = "commission for {word} is {int} naira per {float} units")]
async fn commission_rate(world: &mut StorefrontWorld, category: String, naira: i64, per_unit: f64) {
    let rates = json!({ category: { "amount": Kobo::from_naira(naira), "per_unit": per_unit } });
    seed::set_commission_rates(world.db().pool(), rates).await;
}

#[given(expr = "customer {string} with a wallet balance of {int} naira")]
async fn customer(world: &mut StorefrontWorld, name: String, naira: i64) {
    let email = format!("{name}@example.com");
    let id = seed::create_user(world.db().pool(), &email, &name, Kobo::from_naira(naira)).await;
    world.users.insert(name, id);
}

#[given(expr = "approved affiliate {string} with code {word}")]
async fn affiliate(world: &mut StorefrontWorld, name: String, code: String) {
    let email = format!("{name}@example.com");
    let id = seed::create_affiliate(world.db().pool(), &email, &name, &code).await;
    world.users.insert(name, id);
}

#[when(expr = "{string} checks out {string} for delivery to {word}, {word}")]
async fn checkout(world: &mut StorefrontWorld, buyer: String, cart: String, state: String, city: String) {
    place_order(world, &buyer, &cart, &state, &city, None, false).await;
}

#[when(expr = "{string} checks out {string} for delivery to {word}, {word} with code {word}")]
async fn checkout_with_code(
    world: &mut StorefrontWorld,
    buyer: String,
    cart: String,
    state: String,
    city: String,
    code: String,
) {
    place_order(world, &buyer, &cart, &state, &city, Some(code), false).await;
}

#[when(expr = "{string} checks out {string} for delivery to {word}, {word} with code {word} using their wallet")]
async fn checkout_with_code_and_wallet(
    world: &mut StorefrontWorld,
    buyer: String,
    cart: String,
    state: String,
    city: String,
    code: String,
) {
    place_order(world, &buyer, &cart, &state, &city, Some(code), true).await;
}

async fn place_order(
    world: &mut StorefrontWorld,
    buyer: &str,
    cart: &str,
    state: &str,
    city: &str,
    affiliate_code: Option<String>,
    use_wallet_balance: bool,
) {
    let buyer_id = world.user(buyer);
    let items = parse_cart(world, cart);
    let request = CheckoutRequest {
        items,
        shipping_info: ShippingInfo {
            full_name: buyer.to_string(),
            phone: "08030000000".into(),
            email: format!("{buyer}@example.com"),
            state: state.to_string(),
            city: city.to_string(),
            address: "1 Allen Avenue".into(),
        },
        affiliate_code,
        use_wallet_balance,
    };
    match world.system().orders.create_order(buyer_id, request).await {
        Ok(order) => {
            world.last_order = Some(order);
            world.last_error = None;
        },
        Err(e) => {
            world.last_order = None;
            world.last_error = Some(e);
        },
    }
}

/// Parses carts written as `2 x 2kg, 1 x 500ml`
fn parse_cart(world: &StorefrontWorld, cart: &str) -> Vec<CartItem> {
    cart.split(',')
        .map(|item| {
            let (quantity, label) = item.split_once(" x ").unwrap_or_else(|| panic!("Bad cart item: {item}"));
            let quantity = quantity.trim().parse().unwrap_or_else(|_| panic!("Bad quantity: {quantity}"));
            CartItem { sku_id: world.sku(label.trim()), quantity }
        })
        .collect()
}

#[when(regex = r"^the gateway confirms the payment(?: again)?$")]
async fn confirm_payment(world: &mut StorefrontWorld) {
    let (body, signature) = notification(world).await;
    let outcome = world.system().settlement.process_notification(&body, Some(&signature)).await;
    world.last_outcome = Some(outcome);
}

#[when("a notification for the order arrives with a bad signature")]
async fn forged_notification(world: &mut StorefrontWorld) {
    let (body, _) = notification(world).await;
    let signature = calculate_webhook_signature("not-the-secret", &body);
    let outcome = world.system().settlement.process_notification(&body, Some(&signature)).await;
    world.last_outcome = Some(outcome);
}

async fn notification(world: &StorefrontWorld) -> (Vec<u8>, String) {
    let order = world.db().fetch_order(world.last_order().order_id).await.unwrap().expect("Order not found");
    let body = json!({
        "event": "charge.success",
        "data": {
            "reference": order.payment_reference,
            "amount": order.total,
            "metadata": { "order_id": order.id, "order_number": order.order_number }
        }
    })
    .to_string()
    .into_bytes();
    let signature = calculate_webhook_signature(WEBHOOK_SECRET, &body);
    (body, signature)
}

#[then(expr = "the order total is {int} naira")]
async fn order_total(world: &mut StorefrontWorld, naira: i64) {
    assert_eq!(world.last_order().total, Kobo::from_naira(naira));
}

#[then(expr = "the order discount is {int} naira")]
async fn order_discount(world: &mut StorefrontWorld, naira: i64) {
    let order = world.db().fetch_order(world.last_order().order_id).await.unwrap().unwrap();
    assert_eq!(order.discount, Kobo::from_naira(naira));
}

#[then("a payment link is returned")]
async fn payment_link(world: &mut StorefrontWorld) {
    let url = world.last_order().payment_url.as_deref().expect("No payment link");
    assert!(url.starts_with("https://checkout.example.com/MEL-0"), "{url}");
}

#[then("no payment link is returned")]
async fn no_payment_link(world: &mut StorefrontWorld) {
    assert_eq!(world.last_order().payment_url, None);
}

#[then("the checkout is rejected for insufficient stock")]
async fn rejected_for_stock(world: &mut StorefrontWorld) {
    let err = world.last_error.as_ref().expect("Checkout should have failed");
    assert!(matches!(err, StorefrontError::InsufficientStock { .. }), "{err}");
}

#[then(expr = "the order is {word}")]
async fn payment_status(world: &mut StorefrontWorld, status: String) {
    let expected = match status.as_str() {
        "paid" => PaymentStatus::Paid,
        "pending" => PaymentStatus::Pending,
        other => panic!("Unknown payment status {other}"),
    };
    let order = world.db().fetch_order(world.last_order().order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, expected);
}

#[then(expr = "the notification outcome is {word}")]
async fn notification_outcome(world: &mut StorefrontWorld, status: String) {
    match world.last_outcome.as_ref().expect("No notification was processed") {
        Ok(outcome) => assert_eq!(outcome.status(), status),
        Err(e) => panic!("Notification failed: {e}"),
    }
}

#[then("the notification is rejected")]
async fn notification_rejected(world: &mut StorefrontWorld) {
    let outcome = world.last_outcome.as_ref().expect("No notification was processed");
    assert!(matches!(outcome, Err(StorefrontError::Authorization(_))), "{outcome:?}");
}

#[then(expr = "there are {int} {string} in stock")]
async fn stock_level(world: &mut StorefrontWorld, stock: i64, label: String) {
    let sku_id = world.sku(&label);
    assert_eq!(seed::stock_of(world.db().pool(), sku_id).await, stock);
}

#[then(expr = "{string} has a wallet balance of {int} naira")]
async fn wallet_balance(world: &mut StorefrontWorld, name: String, naira: i64) {
    let user = world.db().fetch_user(world.user(&name)).await.unwrap().unwrap();
    assert_eq!(user.wallet_balance, Kobo::from_naira(naira));
}

#[then(expr = "{string} has {int} referral(s)")]
async fn referrals(world: &mut StorefrontWorld, name: String, count: usize) {
    let referrals = world.db().fetch_referrals(world.user(&name)).await.unwrap();
    assert_eq!(referrals.len(), count);
}
