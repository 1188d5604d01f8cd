//! The inventory guard. Stock only ever moves through a conditional `UPDATE`, so it can never go negative no matter how
//! many buyers race for the last units.
use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{db_types::OrderLine, traits::StoreDbError};

/// Removes `quantity` units of stock if, and only if, at least that many are available. Returns the remaining stock.
pub async fn decrement_if_available(
    sku_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, StoreDbError> {
    if quantity <= 0 {
        return Err(StoreDbError::InvalidAmount(format!("Cannot remove {quantity} units from stock")));
    }
    let remaining: Option<(i64,)> = sqlx::query_as(
        r#"UPDATE skus SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND stock >= $1
        RETURNING stock"#,
    )
    .bind(quantity)
    .bind(sku_id)
    .fetch_optional(&mut *conn)
    .await?;
    match remaining {
        Some((stock,)) => {
            debug!("📦️ Removed {quantity} units of SKU #{sku_id} from stock. {stock} remaining");
            Ok(stock)
        },
        None => {
            let available: Option<(i64,)> =
                sqlx::query_as("SELECT stock FROM skus WHERE id = $1").bind(sku_id).fetch_optional(conn).await?;
            let (available,) = available.ok_or(StoreDbError::SkuNotFound(sku_id))?;
            warn!("📦️ Cannot remove {quantity} units of SKU #{sku_id} from stock. Only {available} available");
            Err(StoreDbError::InsufficientStock { sku_id, requested: quantity, available })
        },
    }
}

/// Flips the line's `stock_committed` marker if it is unset. Returns `false` if the line was already committed.
///
/// Must run in the same transaction as the matching [`decrement_if_available`] call.
pub async fn mark_line_committed(line: &OrderLine, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE order_lines SET stock_committed = 1 WHERE id = $1 AND stock_committed = 0")
        .bind(line.id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
