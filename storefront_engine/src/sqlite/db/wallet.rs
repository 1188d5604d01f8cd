//! Wallet balance mutations. Each function here changes `users.wallet_balance` *and* appends the matching ledger
//! entry, but is not atomic on its own: run it inside a transaction and pass `&mut tx`.
use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Kobo, LedgerAccount, LedgerEntry, NewLedgerEntry, WalletAudit},
    traits::StoreDbError,
};

/// Removes `-entry.amount` from the owner's balance, if the balance covers it, and appends `entry`.
pub async fn debit(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<Kobo, StoreDbError> {
    let amount = -entry.amount;
    if !amount.is_positive() {
        return Err(StoreDbError::InvalidAmount(format!("A debit must be negative, but was {}", entry.amount)));
    }
    let owner_id = entry.owner_id;
    let balance: Option<(Kobo,)> = sqlx::query_as(
        r#"UPDATE users SET wallet_balance = wallet_balance - $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND wallet_balance >= $1
        RETURNING wallet_balance"#,
    )
    .bind(amount)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some((balance,)) = balance else {
        let available = fetch_balance(owner_id, conn).await?.ok_or(StoreDbError::UserNotFound(owner_id))?;
        warn!("💰️ Cannot debit {amount} from wallet #{owner_id}. Only {available} available");
        return Err(StoreDbError::InsufficientBalance { requested: amount, available });
    };
    let entry = insert_ledger_entry(entry, conn).await?;
    debug!("💰️ Debited {amount} from wallet #{owner_id} ({}). New balance: {balance}", entry.reference);
    Ok(balance)
}

/// Adds `entry.amount` to the owner's balance and appends `entry`.
pub async fn credit(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<Kobo, StoreDbError> {
    let amount = entry.amount;
    if !amount.is_positive() {
        return Err(StoreDbError::InvalidAmount(format!("A credit must be positive, but was {amount}")));
    }
    let owner_id = entry.owner_id;
    let balance: Option<(Kobo,)> = sqlx::query_as(
        r#"UPDATE users SET wallet_balance = wallet_balance + $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2
        RETURNING wallet_balance"#,
    )
    .bind(amount)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;
    let (balance,) = balance.ok_or(StoreDbError::UserNotFound(owner_id))?;
    let entry = insert_ledger_entry(entry, conn).await?;
    debug!("💰️ Credited {amount} to wallet #{owner_id} ({}). New balance: {balance}", entry.reference);
    Ok(balance)
}

pub async fn fetch_balance(owner_id: i64, conn: &mut SqliteConnection) -> Result<Option<Kobo>, sqlx::Error> {
    let balance: Option<(Kobo,)> =
        sqlx::query_as("SELECT wallet_balance FROM users WHERE id = $1").bind(owner_id).fetch_optional(conn).await?;
    Ok(balance.map(|(b,)| b))
}

/// Appends a row to the ledger. Fails with a unique violation if the reference has been used before.
pub async fn insert_ledger_entry(
    entry: NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"INSERT INTO transactions (owner_id, order_id, tx_type, account, amount, reference, status, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *"#,
    )
    .bind(entry.owner_id)
    .bind(entry.order_id)
    .bind(entry.tx_type.to_string())
    .bind(entry.account.to_string())
    .bind(entry.amount)
    .bind(entry.reference)
    .bind(entry.status.to_string())
    .bind(sqlx::types::Json(entry.metadata))
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

pub async fn wallet_audit(owner_id: i64, conn: &mut SqliteConnection) -> Result<WalletAudit, StoreDbError> {
    let balance = fetch_balance(owner_id, conn).await?.ok_or(StoreDbError::UserNotFound(owner_id))?;
    let (ledger_sum,): (i64,) = sqlx::query_as(
        r#"SELECT COALESCE(SUM(amount), 0) FROM transactions
        WHERE owner_id = $1 AND account = $2 AND status != 'Failed'"#,
    )
    .bind(owner_id)
    .bind(LedgerAccount::Wallet.to_string())
    .fetch_one(conn)
    .await?;
    Ok(WalletAudit { owner_id, balance, ledger_sum: Kobo::from(ledger_sum) })
}
