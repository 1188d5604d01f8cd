use thiserror::Error;

use crate::{
    db_types::{Kobo, NewDiscrepancy, NewLedgerEntry, NewOrder, NewReferral, Order, OrderLine, Referral},
    traits::{AccountManagement, CatalogManagement, InventoryManagement, WalletManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the storefront engine.
///
/// Beyond the narrower catalog, account, inventory and wallet contracts, it provides the multi-step operations of the
/// order and settlement flows. Each method here must be applied as a single atomic unit: either every write happens,
/// or none do.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase:
    Clone + CatalogManagement + AccountManagement + InventoryManagement + WalletManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persists a fully priced order in a single atomic transaction:
    /// * the shipping snapshot is stored,
    /// * the order row is inserted and given its `MEL-` order number,
    /// * every line is inserted,
    /// * if `wallet_deduction` is non-zero, the buyer's wallet is debited and a `WALLET-<order_number>` ledger entry
    ///   is appended.
    ///
    /// If the wallet no longer holds enough funds, [`StoreDbError::InsufficientBalance`] is returned and no order is
    /// created.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>), StoreDbError>;

    /// Stores the gateway reference for an order that is still pending, replacing any previous reference.
    ///
    /// Returns `None` if the order does not exist or is no longer pending.
    async fn attach_payment_reference(&self, order_id: i64, reference: &str) -> Result<Option<Order>, StoreDbError>;

    /// Fetches the order only if both its id and its stored payment reference match.
    async fn fetch_order_by_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
    ) -> Result<Option<Order>, StoreDbError>;

    /// Conditionally moves the order from `Pending` to `Paid`/`Processing`, setting its payment reference.
    ///
    /// Returns the updated order if this call made the transition, or `None` if the order was no longer pending.
    /// Exactly one of any number of concurrent callers receives `Some`.
    async fn mark_order_paid(&self, order_id: i64, reference: &str) -> Result<Option<Order>, StoreDbError>;

    /// Records a line whose stock could not be committed. Returns `false` if the line already has a discrepancy.
    async fn record_discrepancy(&self, discrepancy: NewDiscrepancy) -> Result<bool, StoreDbError>;

    /// Appends the buyer's gateway payment to the ledger. Returns `false` if an entry with the same reference already
    /// exists.
    async fn record_gateway_payment(&self, entry: NewLedgerEntry) -> Result<bool, StoreDbError>;

    /// Inserts the referral and, only if it is new, credits the affiliate's wallet with `entry` in the same atomic
    /// unit. Returns `None` if the order already has a referral, in which case nothing is credited.
    async fn award_commission(
        &self,
        referral: NewReferral,
        entry: NewLedgerEntry,
    ) -> Result<Option<Referral>, StoreDbError>;

    /// Marks the settlement of a paid order as finished. Returns `true` only for the call that flipped the marker.
    async fn complete_settlement(&self, order_id: i64) -> Result<bool, StoreDbError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("The requested SKU {0} does not exist")]
    SkuNotFound(i64),
    #[error("Insufficient stock for SKU {sku_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { sku_id: i64, requested: i64, available: i64 },
    #[error("Insufficient wallet balance. Requested {requested}, but only {available} available")]
    InsufficientBalance { requested: Kobo, available: Kobo },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Cannot insert record, since it already exists. {0}")]
    DuplicateEntry(String),
    #[error("The store setting '{key}' is invalid. {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl From<sqlx::Error> for StoreDbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref de) if de.is_unique_violation() => Self::DuplicateEntry(de.message().to_string()),
            _ => Self::DatabaseError(e.to_string()),
        }
    }
}
