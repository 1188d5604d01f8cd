use crate::{
    db_types::{Kobo, NewLedgerEntry, WalletAudit},
    traits::StoreDbError,
};

/// The wallet ledger. Every balance change is applied as a conditional update on the owner's row and recorded in the
/// same atomic unit as a ledger entry. Balances never go negative.
#[allow(async_fn_in_trait)]
pub trait WalletManagement {
    /// Removes `-entry.amount` from `entry.owner_id`'s wallet and appends `entry` to the ledger. `entry.amount` must be
    /// negative.
    ///
    /// Returns the new balance, or [`StoreDbError::InsufficientBalance`] if the wallet does not hold enough funds.
    async fn debit_wallet(&self, entry: NewLedgerEntry) -> Result<Kobo, StoreDbError>;

    /// Adds `entry.amount` to `entry.owner_id`'s wallet and appends `entry` to the ledger. `entry.amount` must be
    /// positive. Returns the new balance.
    async fn credit_wallet(&self, entry: NewLedgerEntry) -> Result<Kobo, StoreDbError>;

    /// Compares the cached balance with the sum of the owner's wallet ledger entries.
    async fn wallet_audit(&self, owner_id: i64) -> Result<WalletAudit, StoreDbError>;
}
