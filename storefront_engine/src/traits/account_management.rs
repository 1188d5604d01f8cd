use crate::{
    db_types::{
        LedgerEntry,
        Order,
        OrderLine,
        OrderStatus,
        Referral,
        SettlementDiscrepancy,
        ShippingInfo,
        TransactionType,
        UserAccount,
    },
    traits::StoreDbError,
};

/// Queries over users, their orders and their ledger history.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, StoreDbError>;

    /// Looks up a user by affiliate code. `code` must already be normalised (trimmed, upper case). Whether the
    /// affiliate is approved is for the caller to decide.
    async fn fetch_affiliate_by_code(&self, code: &str) -> Result<Option<UserAccount>, StoreDbError>;

    /// The orders placed by the user, newest first. If `status` is given, only orders with that order status are
    /// returned.
    async fn fetch_orders_for_user(
        &self,
        user_id: i64,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreDbError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreDbError>;

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, StoreDbError>;

    /// The shipping snapshot taken when an order was placed.
    async fn fetch_shipping_info(&self, shipping_id: i64) -> Result<Option<ShippingInfo>, StoreDbError>;

    /// Referrals credited to the affiliate, newest first.
    async fn fetch_referrals(&self, affiliate_id: i64) -> Result<Vec<Referral>, StoreDbError>;

    /// The owner's most recent ledger entries of the given types, newest first. An empty `types` slice matches all
    /// types.
    async fn fetch_ledger_entries(
        &self,
        owner_id: i64,
        types: &[TransactionType],
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, StoreDbError>;

    async fn fetch_discrepancies(&self, order_id: i64) -> Result<Vec<SettlementDiscrepancy>, StoreDbError>;

    /// Marks the user as an (unapproved) affiliate with the given code.
    ///
    /// Returns `None` if the user does not exist or is already an affiliate. Returns [`StoreDbError::DuplicateEntry`]
    /// if the code is already taken, so that the caller can retry with a different one.
    async fn register_affiliate(&self, user_id: i64, code: &str) -> Result<Option<UserAccount>, StoreDbError>;
}
