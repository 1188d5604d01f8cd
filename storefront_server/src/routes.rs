//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine, which in turn awaits the
//! database and the payment gateway, so none of them block.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use bytes::Bytes;
use log::*;
use storefront_engine::{
    affiliate_objects::WithdrawalRequest,
    order_objects::CheckoutRequest,
    traits::{PaymentGateway, StorefrontDatabase},
    AffiliateApi,
    CheckoutApi,
    OrderFlowApi,
    SettlementApi,
    StorefrontError,
    WalletApi,
};

use crate::{
    auth::JwtClaims,
    config::ServerOptions,
    data_objects::{OrderQuery, WebhookAck},
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
};

pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout_calculate => Post "/checkout/calculate" impl StorefrontDatabase);
/// Prices a cart exactly as placing the order would, without writing anything.
pub async fn checkout_calculate<B: StorefrontDatabase>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST checkout/calculate for user #{}", claims.user_id);
    let quote = api.quote(claims.user_id, &body).await?;
    Ok(HttpResponse::Ok().json(quote))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl StorefrontDatabase, PaymentGateway);
pub async fn create_order<B, G>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST orders for user #{}", claims.user_id);
    let created = api.create_order(claims.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

route!(my_orders => Get "/orders" impl StorefrontDatabase, PaymentGateway);
pub async fn my_orders<B, G>(
    claims: JwtClaims,
    query: web::Query<OrderQuery>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    G: PaymentGateway,
{
    let status = query.into_inner().status;
    debug!("💻️ GET orders for user #{} with status {status:?}", claims.user_id);
    let orders = api.orders_for_user(claims.user_id, status).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl StorefrontDatabase, PaymentGateway);
pub async fn order_by_id<B, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for user #{}", claims.user_id);
    let details = api.order_for_user(claims.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(retry_payment => Post "/orders/{order_id}/pay" impl StorefrontDatabase, PaymentGateway);
/// Opens a new payment for an unpaid order, e.g. after the gateway was unavailable at checkout. Orders paid from the
/// wallet finish their settlement instead.
pub async fn retry_payment<B, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ POST pay for order #{order_id} by user #{}", claims.user_id);
    let retry = api.retry_payment(claims.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(retry))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(paystack_webhook => Post "/webhook/paystack" impl StorefrontDatabase);
/// Receives Paystack event notifications.
///
/// The body is taken as raw bytes, since the signature covers the exact bytes sent. Paystack retries any delivery
/// that does not get a 200, so duplicates and unrelated events are acknowledged with 200 as well.
pub async fn paystack_webhook<B: StorefrontDatabase>(
    req: HttpRequest,
    body: Bytes,
    api: web::Data<SettlementApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let remote_ip = get_remote_ip(&req, options.use_x_forwarded_for);
    trace!("💻️ Received Paystack notification from {remote_ip:?}");
    let signature = req.headers().get(PAYSTACK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = api.process_notification(&body, signature).await.map_err(|e| match e {
        StorefrontError::Authorization(_) => {
            warn!("💻️ Rejected a Paystack notification from {remote_ip:?}. {e}");
            ServerError::from(AuthError::InvalidSignature)
        },
        e => ServerError::from(e),
    })?;
    debug!("💻️ Paystack notification handled: {}", outcome.status());
    Ok(HttpResponse::Ok().json(WebhookAck::from(&outcome)))
}

//----------------------------------------------   Affiliates  ----------------------------------------------------
route!(validate_affiliate_code => Get "/affiliate/validate/{code}" impl StorefrontDatabase);
pub async fn validate_affiliate_code<B: StorefrontDatabase>(
    path: web::Path<String>,
    api: web::Data<AffiliateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let check = api.validate_affiliate_code(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(check))
}

route!(affiliate_register => Post "/affiliate/register" impl StorefrontDatabase);
pub async fn affiliate_register<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<AffiliateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST affiliate/register for user #{}", claims.user_id);
    let registration = api.register_affiliate(claims.user_id).await?;
    Ok(HttpResponse::Created().json(registration))
}

route!(affiliate_dashboard => Get "/affiliate/dashboard" impl StorefrontDatabase);
pub async fn affiliate_dashboard<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<AffiliateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET affiliate/dashboard for user #{}", claims.user_id);
    let dashboard = api.affiliate_dashboard(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

route!(affiliate_withdraw => Post "/affiliate/withdraw" impl StorefrontDatabase);
pub async fn affiliate_withdraw<B: StorefrontDatabase>(
    claims: JwtClaims,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<AffiliateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST affiliate/withdraw of {} for user #{}", body.amount, claims.user_id);
    let receipt = api.request_withdrawal(claims.user_id, body.amount).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

//----------------------------------------------   Wallet  ----------------------------------------------------
route!(wallet_audit => Get "/wallet/audit" impl StorefrontDatabase);
/// Compares the caller's cached wallet balance with the sum of their ledger.
pub async fn wallet_audit<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let audit = api.audit(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(audit))
}
