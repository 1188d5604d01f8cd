//! A small client for the parts of the Paystack REST API used by the storefront: initializing a card transaction
//! and receiving the hosted checkout URL for it.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{InitializeTransaction, PaystackResponse, TransactionAuthorization, TransactionMetadata};
pub use error::PaystackApiError;
