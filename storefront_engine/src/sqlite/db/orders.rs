use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, ShippingInfo},
    helpers::order_number,
};

/// Inserts the order, its shipping snapshot and its lines. This is not atomic. Embed the call in a transaction and pass
/// `&mut tx` as the connection argument.
///
/// The order number is derived from the row id, so it is assigned by a second statement in the same unit of work.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, Vec<OrderLine>), sqlx::Error> {
    let shipping_id = insert_shipping_info(order.user_id, &order.shipping, &mut *conn).await?;
    let (id,): (i64,) = sqlx::query_as(
        r#"INSERT INTO orders (
            user_id,
            shipping_id,
            subtotal,
            discount,
            delivery_fee,
            wallet_deduction,
            total,
            affiliate_code,
            affiliate_id,
            commission_rates
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id"#,
    )
    .bind(order.user_id)
    .bind(shipping_id)
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(order.delivery_fee)
    .bind(order.wallet_deduction)
    .bind(order.total)
    .bind(order.affiliate_code)
    .bind(order.affiliate_id)
    .bind(Json(order.commission_rates))
    .fetch_one(&mut *conn)
    .await?;
    let saved: Order =
        sqlx::query_as("UPDATE orders SET order_number = $1 WHERE id = $2 RETURNING *")
            .bind(order_number(id))
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    let mut lines = Vec::with_capacity(order.lines.len());
    for line in order.lines {
        lines.push(insert_order_line(id, line, &mut *conn).await?);
    }
    debug!("🗃️ Order {} saved with id {id} and {} lines", saved.order_number, lines.len());
    Ok((saved, lines))
}

async fn insert_shipping_info(
    user_id: i64,
    shipping: &ShippingInfo,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"INSERT INTO shipping_info (user_id, full_name, phone, email, state, city, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id"#,
    )
    .bind(user_id)
    .bind(&shipping.full_name)
    .bind(&shipping.phone)
    .bind(&shipping.email)
    .bind(&shipping.state)
    .bind(&shipping.city)
    .bind(&shipping.address)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

async fn insert_order_line(
    order_id: i64,
    line: NewOrderLine,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, sqlx::Error> {
    let line = sqlx::query_as(
        r#"INSERT INTO order_lines (order_id, sku_id, quantity, unit_price, line_total)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *"#,
    )
    .bind(order_id)
    .bind(line.sku_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.line_total)
    .fetch_one(conn)
    .await?;
    Ok(line)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_reference(
    order_id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND payment_reference = $2")
        .bind(order_id)
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// A user's orders, newest first. Only orders in `status` are returned if it is given.
pub async fn fetch_orders_for_user(
    user_id: i64,
    status: Option<OrderStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE user_id = ");
    builder.push_bind(user_id);
    if let Some(status) = status {
        builder.push(" AND order_status = ");
        builder.push_bind(status.to_string());
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

pub async fn fetch_shipping_info(
    shipping_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ShippingInfo>, sqlx::Error> {
    let row: Option<(String, String, String, String, String, String)> = sqlx::query_as(
        "SELECT full_name, phone, email, state, city, address FROM shipping_info WHERE id = $1",
    )
    .bind(shipping_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(full_name, phone, email, state, city, address)| ShippingInfo {
        full_name,
        phone,
        email,
        state,
        city,
        address,
    }))
}

/// Replaces the payment reference of an order that has not been paid yet.
pub async fn attach_payment_reference(
    order_id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"UPDATE orders SET payment_reference = $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND payment_status = 'Pending'
        RETURNING *"#,
    )
    .bind(reference)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
