use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Kobo, NewLedgerEntry, WalletAudit},
    sf_api::errors::StorefrontError,
    traits::WalletManagement,
};

/// Direct access to the wallet ledger. Every balance change made here is paired with a ledger entry in one atomic
/// unit, and no balance is ever allowed to go negative.
pub struct WalletApi<B> {
    db: B,
}

impl<B> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi")
    }
}

impl<B> WalletApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> WalletApi<B>
where B: WalletManagement
{
    /// Takes `amount` out of `entry.owner_id`'s wallet and records `entry` with the matching negative amount.
    /// Returns the new balance.
    pub async fn debit(&self, amount: Kobo, mut entry: NewLedgerEntry) -> Result<Kobo, StorefrontError> {
        if !amount.is_positive() {
            return Err(StorefrontError::InvalidAmount(format!("Cannot debit {amount} from a wallet")));
        }
        entry.amount = -amount;
        let owner = entry.owner_id;
        let balance = self.db.debit_wallet(entry).await?;
        trace!("💰️ Wallet #{owner} debited by {amount}");
        Ok(balance)
    }

    /// Adds `amount` to `entry.owner_id`'s wallet and records `entry`. Returns the new balance.
    pub async fn credit(&self, amount: Kobo, mut entry: NewLedgerEntry) -> Result<Kobo, StorefrontError> {
        if !amount.is_positive() {
            return Err(StorefrontError::InvalidAmount(format!("Cannot credit {amount} to a wallet")));
        }
        entry.amount = amount;
        let owner = entry.owner_id;
        let balance = self.db.credit_wallet(entry).await?;
        trace!("💰️ Wallet #{owner} credited with {amount}");
        Ok(balance)
    }

    /// Compares the user's cached balance with their ledger. A mismatch is logged as an error.
    pub async fn audit(&self, owner_id: i64) -> Result<WalletAudit, StorefrontError> {
        let audit = self.db.wallet_audit(owner_id).await?;
        if !audit.is_consistent() {
            error!(
                "💰️ Wallet #{owner_id} holds {}, but its ledger sums to {}",
                audit.balance, audit.ledger_sum
            );
        }
        Ok(audit)
    }
}
