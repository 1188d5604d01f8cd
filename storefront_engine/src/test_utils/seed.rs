//! Seeds catalog, user and settings rows. These tables are owned by the wider storefront, so the engine itself never
//! writes them outside of tests.
use sqlx::SqlitePool;

use crate::{
    db_types::Kobo,
    sqlite::db::catalog::{upsert_setting, COMMISSION_RATES_KEY, DELIVERY_FEES_KEY, DISCOUNT_PERCENTAGE_KEY},
};

pub async fn create_user(pool: &SqlitePool, email: &str, full_name: &str, wallet_balance: Kobo) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO users (email, full_name, wallet_balance) VALUES ($1, $2, $3) RETURNING id")
            .bind(email)
            .bind(full_name)
            .bind(wallet_balance)
            .fetch_one(pool)
            .await
            .expect("Error creating user");
    if wallet_balance.is_positive() {
        // Opening balances get a ledger entry, so that wallet audits balance from the start
        sqlx::query(
            r#"INSERT INTO transactions (owner_id, tx_type, account, amount, reference, status)
            VALUES ($1, 'Adjustment', 'Wallet', $2, $3, 'Completed')"#,
        )
        .bind(id)
        .bind(wallet_balance)
        .bind(format!("OPENING-{id}"))
        .execute(pool)
        .await
        .expect("Error recording opening balance");
    }
    id
}

/// Creates an approved affiliate with complete bank details.
pub async fn create_affiliate(pool: &SqlitePool, email: &str, full_name: &str, code: &str) -> i64 {
    let id = create_user(pool, email, full_name, Kobo::default()).await;
    sqlx::query(
        r#"UPDATE users SET
            is_affiliate = 1,
            affiliate_code = $1,
            affiliate_approved = 1,
            bank_account_name = $2,
            bank_account_number = '0123456789',
            bank_name = 'First Bank'
        WHERE id = $3"#,
    )
    .bind(code)
    .bind(full_name)
    .bind(id)
    .execute(pool)
    .await
    .expect("Error creating affiliate");
    id
}

pub async fn create_product(pool: &SqlitePool, name: &str, category: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO products (name, category) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(category)
        .fetch_one(pool)
        .await
        .expect("Error creating product");
    id
}

pub async fn create_sku(
    pool: &SqlitePool,
    product_id: i64,
    size_label: &str,
    size_value: f64,
    price: Kobo,
    stock: i64,
) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO skus (product_id, size_label, size_value, price, stock) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(product_id)
    .bind(size_label)
    .bind(size_value)
    .bind(price)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Error creating SKU");
    id
}

pub async fn set_stock(pool: &SqlitePool, sku_id: i64, stock: i64) {
    sqlx::query("UPDATE skus SET stock = $1 WHERE id = $2")
        .bind(stock)
        .bind(sku_id)
        .execute(pool)
        .await
        .expect("Error setting stock");
}

pub async fn stock_of(pool: &SqlitePool, sku_id: i64) -> i64 {
    let (stock,): (i64,) =
        sqlx::query_as("SELECT stock FROM skus WHERE id = $1").bind(sku_id).fetch_one(pool).await.expect("No such SKU");
    stock
}

pub async fn set_discount_percentage(pool: &SqlitePool, percentage: f64) {
    let mut conn = pool.acquire().await.expect("No connection");
    upsert_setting(DISCOUNT_PERCENTAGE_KEY, &percentage.to_string(), &mut conn).await.expect("Error saving setting");
}

/// `fees` is the JSON fee table, in kobo, e.g. `{"LAGOS": {"DEFAULT": 150000}}`
pub async fn set_delivery_fees(pool: &SqlitePool, fees: serde_json::Value) {
    let mut conn = pool.acquire().await.expect("No connection");
    upsert_setting(DELIVERY_FEES_KEY, &fees.to_string(), &mut conn).await.expect("Error saving setting");
}

/// `rates` is the JSON rate table, e.g. `{"BLACK_SOAP": {"amount": 50000, "per_unit": 1.0}}`
pub async fn set_commission_rates(pool: &SqlitePool, rates: serde_json::Value) {
    let mut conn = pool.acquire().await.expect("No connection");
    upsert_setting(COMMISSION_RATES_KEY, &rates.to_string(), &mut conn).await.expect("Error saving setting");
}

pub async fn count_rows(pool: &SqlitePool, sql: &str, id: i64) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).bind(id).fetch_one(pool).await.expect("Error counting rows");
    n
}

/// Puts a settled order back in the state it would be in had its settlement stopped right after the order was
/// claimed: the order is paid, but its lines' stock is back on the shelf and it is not marked as settled.
pub async fn rewind_settlement(pool: &SqlitePool, order_id: i64) {
    let mut tx = pool.begin().await.expect("No transaction");
    sqlx::query(
        "UPDATE skus SET stock = stock + (SELECT quantity FROM order_lines WHERE order_lines.sku_id = skus.id AND \
         order_lines.order_id = $1) WHERE id IN (SELECT sku_id FROM order_lines WHERE order_id = $1 AND \
         stock_committed = 1)",
    )
    .bind(order_id)
    .execute(&mut *tx)
    .await
    .expect("Error restoring stock");
    sqlx::query("UPDATE order_lines SET stock_committed = 0 WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .expect("Error resetting order lines");
    sqlx::query("UPDATE orders SET settlement_complete = 0 WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .expect("Error resetting order");
    tx.commit().await.expect("Error committing rewind");
}
