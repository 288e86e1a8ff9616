use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use upg_common::Amount;

use crate::db_types::{Reservation, ReservationStatus, TradeId};

/// Ledger query: does an active (`Locked`) reservation exist for `(token, amount)`?
///
/// Expired-but-unswept reservations still count as active here. The partial unique index on the ledger treats them
/// the same way, so the allocator and the index never disagree about which pairs are free.
pub async fn reservation_active(
    token: &str,
    amount: Amount,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reservations WHERE token = $1 AND amount = $2 AND status = 'Locked'")
            .bind(token)
            .bind(amount)
            .fetch_one(conn)
            .await?;
    Ok(count.0 > 0)
}

/// Writes a `Locked` reservation for `(token, amount)` owned by `trade_id`. Not atomic on its own; always called
/// inside the same transaction that inserts the owning order.
pub async fn insert_reservation(
    token: &str,
    amount: Amount,
    trade_id: &TradeId,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO reservations (token, amount, trade_id, expires_at) VALUES ($1, $2, $3, $4)")
        .bind(token)
        .bind(amount)
        .bind(trade_id)
        .bind(expires_at)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches the reservation owned by `trade_id`, whatever its status.
pub async fn fetch_reservation_by_trade_id(
    trade_id: &TradeId,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, sqlx::Error> {
    sqlx::query_as::<_, Reservation>(
        "SELECT id, token, amount, trade_id, status, expires_at, created_at FROM reservations WHERE trade_id = $1",
    )
    .bind(trade_id)
    .fetch_optional(conn)
    .await
}

/// Releases the active reservation owned by `trade_id`, recording why (`Released` on settlement, `Expired` on
/// timeout). A no-op when the reservation has already been released.
pub async fn release_by_trade_id(
    trade_id: &TradeId,
    status: ReservationStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE reservations SET status = $1 WHERE trade_id = $2 AND status = 'Locked'")
        .bind(status)
        .bind(trade_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
