//! Storefront Engine
//!
//! The storefront engine prices carts, turns them into orders and settles those orders when the payment gateway
//! reports a successful charge. It holds the core logic of the storefront backend and is independent of any HTTP
//! framework.
//!
//! The library is divided into these main sections:
//! 1. The backend contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You
//!    should never need to touch the database directly; use the public APIs instead. The data types stored in the
//!    database are defined in [`mod@db_types`] and are public.
//! 2. The public APIs ([`mod@sf_api`]): checkout pricing, the order flow, the settlement reconciler, the wallet ledger
//!    and the affiliate programme.
//!
//! The engine also emits events that can be subscribed to ([`mod@events`]), for example when an order has been paid,
//! or when a paid order could not be taken out of stock.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod sf_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sf_api::{
    affiliate_api::AffiliateApi,
    affiliate_objects,
    errors::StorefrontError,
    order_flow_api::OrderFlowApi,
    order_objects,
    pricing::{price_cart, CheckoutApi, PriceBreakdown, PricingInputs},
    settlement_api::SettlementApi,
    settlement_objects,
    wallet_api::WalletApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
