use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{LedgerEntry, Referral, TransactionType, UserAccount};

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_affiliate_by_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE affiliate_code = $1 AND is_affiliate = 1")
        .bind(code)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Sets the affiliate flag and code on a user that is not an affiliate yet. New affiliates start unapproved.
pub async fn register_affiliate(
    user_id: i64,
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let user: Option<UserAccount> = sqlx::query_as(
        r#"UPDATE users SET
            is_affiliate = 1,
            affiliate_code = $1,
            affiliate_approved = 0,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND is_affiliate = 0
        RETURNING *"#,
    )
    .bind(code)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    if user.is_some() {
        debug!("🗃️ User #{user_id} registered as an affiliate with code {code}");
    }
    Ok(user)
}

pub async fn fetch_referrals(affiliate_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Referral>, sqlx::Error> {
    let referrals = sqlx::query_as("SELECT * FROM referrals WHERE affiliate_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(affiliate_id)
        .fetch_all(conn)
        .await?;
    Ok(referrals)
}

/// The owner's most recent ledger entries, optionally restricted to the given transaction types.
pub async fn fetch_ledger_entries(
    owner_id: i64,
    types: &[TransactionType],
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM transactions WHERE owner_id = ");
    builder.push_bind(owner_id);
    if !types.is_empty() {
        builder.push(" AND tx_type IN (");
        let mut in_clause = builder.separated(", ");
        for t in types {
            in_clause.push_bind(t.to_string());
        }
        builder.push(")");
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    trace!("🗃️ Executing query: {}", builder.sql());
    let entries = builder.build_query_as::<LedgerEntry>().fetch_all(conn).await?;
    Ok(entries)
}
