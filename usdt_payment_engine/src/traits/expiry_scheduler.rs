use chrono::Duration;

use crate::{db_types::TradeId, traits::PaymentGatewayError};

/// Capability interface over the external delayed-job facility.
///
/// The engine schedules one expiry job per order at creation time. Delivery is at-least-once and may be late; the
/// expiry path is idempotent, so implementations are free to redeliver. Implementations must not assume the order
/// is still pending when the job fires.
#[allow(async_fn_in_trait)]
pub trait ExpiryScheduler {
    /// Arranges for the order identified by `trade_id` to be expired after `delay`.
    async fn schedule_expiry(&self, trade_id: TradeId, delay: Duration) -> Result<(), PaymentGatewayError>;
}
