use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use paystack_tools::PaystackApi;
use storefront_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    traits::{PaymentGateway, StorefrontDatabase},
    AffiliateApi,
    CheckoutApi,
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
    WalletApi,
};

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::PaystackGateway,
    routes::{
        health,
        AffiliateDashboardRoute,
        AffiliateRegisterRoute,
        AffiliateWithdrawRoute,
        CheckoutCalculateRoute,
        CreateOrderRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PaystackWebhookRoute,
        RetryPaymentRoute,
        ValidateAffiliateCodeRoute,
        WalletAuditRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = PaystackApi::new(config.paystack.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaystackGateway::new(api);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B, G>(
    config: ServerConfig,
    db: B,
    gateway: G,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    B: StorefrontDatabase + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let app_state = AppState::new(&config, db, gateway, producers);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sf::access_log"))
            .configure(|cfg| app_state.configure(cfg))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// The shared API objects behind every route. Each is wrapped in [`web::Data`], so cloning the state for a new
/// worker only bumps reference counts.
pub struct AppState<B, G> {
    checkout: web::Data<CheckoutApi<B>>,
    orders: web::Data<OrderFlowApi<B, G>>,
    settlement: web::Data<SettlementApi<B>>,
    affiliates: web::Data<AffiliateApi<B>>,
    wallet: web::Data<WalletApi<B>>,
    validator: web::Data<TokenValidator>,
    options: web::Data<ServerOptions>,
}

impl<B, G> Clone for AppState<B, G> {
    fn clone(&self) -> Self {
        Self {
            checkout: self.checkout.clone(),
            orders: self.orders.clone(),
            settlement: self.settlement.clone(),
            affiliates: self.affiliates.clone(),
            wallet: self.wallet.clone(),
            validator: self.validator.clone(),
            options: self.options.clone(),
        }
    }
}

impl<B, G> AppState<B, G>
where
    B: StorefrontDatabase + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(config: &ServerConfig, db: B, gateway: G, producers: EventProducers) -> Self {
        let secret = config.paystack.secret_key.clone();
        Self {
            checkout: web::Data::new(CheckoutApi::new(db.clone())),
            orders: web::Data::new(OrderFlowApi::new(db.clone(), gateway, producers.clone())),
            settlement: web::Data::new(SettlementApi::new(db.clone(), producers, secret)),
            affiliates: web::Data::new(AffiliateApi::new(db.clone())),
            wallet: web::Data::new(WalletApi::new(db)),
            validator: web::Data::new(TokenValidator::new(&config.auth)),
            options: web::Data::new(ServerOptions::from_config(config)),
        }
    }

    /// Registers the app data and every route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let api_scope = web::scope("/api")
            .service(CheckoutCalculateRoute::<B>::new())
            .service(CreateOrderRoute::<B, G>::new())
            .service(MyOrdersRoute::<B, G>::new())
            .service(OrderByIdRoute::<B, G>::new())
            .service(RetryPaymentRoute::<B, G>::new())
            .service(AffiliateWithdrawRoute::<B>::new())
            .service(AffiliateRegisterRoute::<B>::new())
            .service(AffiliateDashboardRoute::<B>::new())
            .service(WalletAuditRoute::<B>::new());
        cfg.app_data(self.checkout.clone())
            .app_data(self.orders.clone())
            .app_data(self.settlement.clone())
            .app_data(self.affiliates.clone())
            .app_data(self.wallet.clone())
            .app_data(self.validator.clone())
            .app_data(self.options.clone())
            .service(health)
            .service(PaystackWebhookRoute::<B>::new())
            .service(ValidateAffiliateCodeRoute::<B>::new())
            .service(api_scope);
    }
}

/// Writes settlement events to the log. Fulfilment and alerting hang off these same hooks.
fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        async move {
            info!("📬️ Order {} is paid. {} is due for delivery.", ev.order.order_number, ev.order.total);
        }
        .boxed()
    });
    hooks.on_settlement_discrepancy(|ev| {
        async move {
            error!(
                "📬️ Order {} was paid, but SKU #{} is short by {} units. Manual follow-up required.",
                ev.order_number,
                ev.discrepancy.sku_id,
                ev.discrepancy.requested - ev.discrepancy.available
            );
        }
        .boxed()
    });
    hooks
}
