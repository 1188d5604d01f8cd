//! The public storefront APIs. Each API is generic over its backend and only relies on the contracts in
//! [`crate::traits`].
pub mod affiliate_api;
pub mod affiliate_objects;
pub mod commission;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod pricing;
pub mod settlement_api;
pub mod settlement_objects;
pub mod wallet_api;
