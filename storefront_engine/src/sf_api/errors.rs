use thiserror::Error;

use crate::{db_types::Kobo, traits::GatewayError, traits::StoreDbError};

/// The error type returned by every public storefront API.
#[derive(Debug, Clone, Error)]
pub enum StorefrontError {
    #[error("Invalid request. {0}")]
    Validation(String),
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Invalid amount. {0}")]
    InvalidAmount(String),
    #[error("SKU {0} does not exist")]
    UnknownSku(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("Insufficient stock for SKU {sku_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { sku_id: i64, requested: i64, available: i64 },
    #[error("Insufficient wallet balance. Requested {requested}, but only {available} available")]
    InsufficientBalance { requested: Kobo, available: Kobo },
    #[error("Not authorized. {0}")]
    Authorization(String),
    #[error("External service error. {message}")]
    ExternalService { message: String, retryable: bool },
    #[error("Consistency error. {0}")]
    Consistency(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl StorefrontError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService { retryable: true, .. })
    }
}

impl From<StoreDbError> for StorefrontError {
    fn from(e: StoreDbError) -> Self {
        match e {
            StoreDbError::OrderNotFound(id) => Self::OrderNotFound(id),
            StoreDbError::UserNotFound(id) => Self::UserNotFound(id),
            StoreDbError::SkuNotFound(id) => Self::UnknownSku(id),
            StoreDbError::InsufficientStock { sku_id, requested, available } => {
                Self::InsufficientStock { sku_id, requested, available }
            },
            StoreDbError::InsufficientBalance { requested, available } => {
                Self::InsufficientBalance { requested, available }
            },
            StoreDbError::InvalidAmount(s) => Self::InvalidAmount(s),
            StoreDbError::InvalidSetting { key, reason } => {
                Self::DatabaseError(format!("Store setting {key} is misconfigured. {reason}"))
            },
            StoreDbError::DuplicateEntry(s) | StoreDbError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<GatewayError> for StorefrontError {
    fn from(e: GatewayError) -> Self {
        Self::ExternalService { retryable: e.is_retryable(), message: e.to_string() }
    }
}
