//! # Storefront backend contracts
//!
//! This module defines the interface contracts that storefront database *backends* and payment gateways must
//! implement. The public APIs in [`crate::sf_api`] are written purely against these traits.
//!
//! ## Traits
//! * [`StorefrontDatabase`] is the highest-level contract. It bundles the narrower traits below and adds the
//!   multi-step order and settlement operations that must each run as one atomic unit.
//! * [`CatalogManagement`] gives read access to SKUs and store settings. The catalog itself is owned elsewhere.
//! * [`AccountManagement`] covers user, order and ledger queries, plus affiliate registration.
//! * [`InventoryManagement`] is the inventory guard: conditional, never-negative stock decrements.
//! * [`WalletManagement`] is the wallet ledger: balance mutations that always append a ledger row.
//! * [`PaymentGateway`] is the outbound call that opens a card transaction for an order.
mod account_management;
mod catalog_management;
mod data_objects;
mod inventory_management;
mod payment_gateway;
mod storefront_database;
mod wallet_management;

pub use account_management::AccountManagement;
pub use catalog_management::CatalogManagement;
pub use data_objects::{PaymentRequest, PaymentSession, StockCommit};
pub use inventory_management::InventoryManagement;
pub use payment_gateway::{GatewayError, PaymentGateway};
pub use storefront_database::{StoreDbError, StorefrontDatabase};
pub use wallet_management::WalletManagement;
