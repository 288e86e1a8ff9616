use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{NewOrder, Order, TradeId};

const ORDER_COLUMNS: &str = "id, trade_id, order_id, amount, actual_amount, token, status, notify_url, \
                             redirect_url, block_transaction_id, created_at, updated_at, expires_at";

/// Inserts a new order row in `WaitPay` status. Not atomic on its own; embed the call in a transaction and pass
/// `&mut *tx` as the connection argument when the reservation must be written alongside.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let record: (i64,) = sqlx::query_as(
        r#"
            INSERT INTO orders (trade_id, order_id, amount, actual_amount, token, notify_url, redirect_url, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id;
        "#,
    )
    .bind(&order.trade_id)
    .bind(&order.order_id)
    .bind(order.amount)
    .bind(order.actual_amount)
    .bind(&order.token)
    .bind(&order.notify_url)
    .bind(&order.redirect_url)
    .bind(order.expires_at)
    .fetch_one(conn)
    .await?;
    Ok(record.0)
}

pub async fn fetch_order_by_order_id(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1");
    sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order_by_trade_id(
    trade_id: &TradeId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE trade_id = $1");
    sqlx::query_as::<_, Order>(&sql).bind(trade_id).fetch_optional(conn).await
}

/// Returns the order that settled against the given on-chain transaction, if any. This is the lookup behind the
/// finalize idempotency guard.
pub async fn fetch_order_by_block_transaction_id(
    block_transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE block_transaction_id = $1");
    sqlx::query_as::<_, Order>(&sql).bind(block_transaction_id).fetch_optional(conn).await
}

/// Flips the order from `WaitPay` to `Paid`, recording the settling transaction. Returns the number of rows
/// changed: 0 means the order was missing or already terminal.
pub async fn mark_paid(
    trade_id: &TradeId,
    block_transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET status = 'Paid', block_transaction_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE trade_id = $2 AND status = 'WaitPay'
        "#,
    )
    .bind(block_transaction_id)
    .bind(trade_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Flips the order from `WaitPay` to `Expired`. Returns 0 rows when the order was missing or already terminal,
/// which makes the expiry path idempotent.
pub async fn mark_expired(trade_id: &TradeId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'Expired', updated_at = CURRENT_TIMESTAMP WHERE trade_id = $1 AND status = 'WaitPay'",
    )
    .bind(trade_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Fetches every `WaitPay` order whose deadline has passed. `now` is bound rather than using `CURRENT_TIMESTAMP`
/// so the comparison uses the same timestamp encoding the engine writes.
pub async fn fetch_overdue_orders(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let sql =
        format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status = 'WaitPay' AND expires_at <= $1 ORDER BY expires_at ASC");
    sqlx::query_as::<_, Order>(&sql).bind(now).fetch_all(conn).await
}
