//! Small utilities shared across the engine.

use chrono::Utc;
use rand::Rng;

use crate::db_types::TradeId;

/// Generates a new trade identifier.
///
/// The id is the current date (`YYYYMMDD`), the current epoch time in milliseconds, and a zero-padded 3-digit
/// random suffix. Ids are short, sortable by day and collision-resistant under the gateway's serialized order
/// creation. They are **not** secrets and are not meant to be unguessable.
pub fn new_trade_id() -> TradeId {
    let now = Utc::now();
    let date = now.format("%Y%m%d");
    let suffix = rand::thread_rng().gen_range(0..1000u32);
    TradeId(format!("{date}{}{suffix:03}", now.timestamp_millis()))
}
