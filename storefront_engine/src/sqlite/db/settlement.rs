//! Statements used by the settlement pipeline. Every one of them is conditional, so replaying a settlement step
//! has no further effect.
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewDiscrepancy, NewReferral, Order, Referral, SettlementDiscrepancy};

/// Claims the order for settlement: `Pending` becomes `Paid` and the order moves to `Processing`.
///
/// Orders without a reference (wallet-covered orders) take `reference` as their payment reference. Returns `None` if
/// the order has already been claimed or carries a different reference.
pub async fn mark_order_paid(
    order_id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"UPDATE orders SET
            payment_status = 'Paid',
            order_status = 'Processing',
            payment_reference = $1,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND payment_status = 'Pending' AND (payment_reference IS NULL OR payment_reference = $1)
        RETURNING *"#,
    )
    .bind(reference)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    if let Some(o) = &order {
        debug!("🧾️ Order {} claimed for settlement with reference {reference}", o.order_number);
    }
    Ok(order)
}

pub async fn complete_settlement(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE orders SET settlement_complete = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND payment_status = 'Paid' AND settlement_complete = 0"#,
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Inserts the referral unless the order already has one. Returns `None` on conflict.
pub async fn insert_referral(
    referral: NewReferral,
    conn: &mut SqliteConnection,
) -> Result<Option<Referral>, sqlx::Error> {
    let referral = sqlx::query_as(
        r#"INSERT INTO referrals (affiliate_id, order_id, buyer_id, commission_amount)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        RETURNING *"#,
    )
    .bind(referral.affiliate_id)
    .bind(referral.order_id)
    .bind(referral.buyer_id)
    .bind(referral.commission_amount)
    .fetch_optional(conn)
    .await?;
    Ok(referral)
}

/// Returns `false` if the line already has a discrepancy on record.
pub async fn insert_discrepancy(d: NewDiscrepancy, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO settlement_discrepancies (order_id, sku_id, requested, available, reason)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (order_id, sku_id) DO NOTHING"#,
    )
    .bind(d.order_id)
    .bind(d.sku_id)
    .bind(d.requested)
    .bind(d.available)
    .bind(d.reason)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_discrepancies(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<SettlementDiscrepancy>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM settlement_discrepancies WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}
