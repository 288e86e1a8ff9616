//! Expiry scheduling implementations.
//!
//! Production deployments typically sit behind a real delayed-job queue; these implementations cover the in-process
//! case and tests. Whatever the implementation, delivery is at-least-once and the expiry path it targets is
//! idempotent, so double-firing is harmless.

use std::time::Duration as StdDuration;

use chrono::Duration;
use log::*;

use crate::{
    db_types::TradeId,
    traits::{ExpiryScheduler, PaymentGatewayError},
};

//--------------------------------------  TokioExpiryScheduler  ------------------------------------------------------
/// An in-process scheduler: each job is a spawned task that sleeps for the delay and then expires the order
/// directly against the backend. Jobs do not survive a process restart, which is why the sweep backstop exists.
#[cfg(feature = "sqlite")]
#[derive(Clone)]
pub struct TokioExpiryScheduler {
    db: crate::SqliteDatabase,
}

#[cfg(feature = "sqlite")]
impl TokioExpiryScheduler {
    pub fn new(db: crate::SqliteDatabase) -> Self {
        Self { db }
    }
}

#[cfg(feature = "sqlite")]
impl ExpiryScheduler for TokioExpiryScheduler {
    async fn schedule_expiry(&self, trade_id: TradeId, delay: Duration) -> Result<(), PaymentGatewayError> {
        use crate::traits::PaymentGatewayDatabase;
        let db = self.db.clone();
        let delay = delay.to_std().unwrap_or(StdDuration::ZERO);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match db.expire_order(&trade_id).await {
                Ok(Some(order)) => debug!("⏲️ Expiry job fired: order {trade_id} ({}) expired", order.token),
                Ok(None) => trace!("⏲️ Expiry job fired for {trade_id}, but the order had already settled or expired"),
                Err(e) => error!("⏲️ Expiry job for {trade_id} failed: {e}. The sweep will pick it up."),
            }
        });
        Ok(())
    }
}

//--------------------------------------     NullScheduler     -------------------------------------------------------
/// Discards every job. Useful in tests, and in deployments that drive expiry entirely off the periodic sweep.
#[derive(Clone, Debug, Default)]
pub struct NullScheduler;

impl ExpiryScheduler for NullScheduler {
    async fn schedule_expiry(&self, trade_id: TradeId, _delay: Duration) -> Result<(), PaymentGatewayError> {
        trace!("⏲️ NullScheduler dropping expiry job for {trade_id}");
        Ok(())
    }
}

//--------------------------------------   start_expiry_sweep  -------------------------------------------------------
/// Spawns the periodic sweep that expires overdue `WaitPay` orders and releases their reservations.
///
/// This is the correctness backstop behind the scheduler: an order whose expiry job was never scheduled (or whose
/// job was lost) is still guaranteed an eventual release. Run one sweep per process.
#[cfg(feature = "sqlite")]
pub fn start_expiry_sweep(db: crate::SqliteDatabase, interval: Duration) -> tokio::task::JoinHandle<()> {
    use crate::traits::PaymentGatewayDatabase;
    let period = interval.to_std().unwrap_or(StdDuration::from_secs(60));
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        // The first tick fires immediately; that is fine, sweeping is idempotent.
        loop {
            timer.tick().await;
            match db.expire_overdue_orders().await {
                Ok(expired) if expired.is_empty() => trace!("⏲️ Sweep found no overdue orders"),
                Ok(expired) => info!("⏲️ Sweep expired {} overdue order(s)", expired.len()),
                Err(e) => error!("⏲️ Expiry sweep failed: {e}"),
            }
        }
    })
}
