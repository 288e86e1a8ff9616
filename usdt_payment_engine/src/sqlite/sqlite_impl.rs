use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;
use upg_common::Amount;

use super::db::{self, orders, reservations, wallets};
use crate::{
    db_types::{NewOrder, Order, ReservationStatus, TradeId, WalletAddress},
    traits::{PaymentGatewayDatabase, PaymentGatewayError, WalletManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from `UPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let url = db::db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = db::new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), PaymentGatewayError> {
        db::MIGRATOR.run(&self.pool).await.map_err(|e| PaymentGatewayError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl WalletManagement for SqliteDatabase {
    async fn upsert_wallet(&self, token: &str, enabled: bool) -> Result<WalletAddress, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::upsert_wallet(token, enabled, &mut conn).await?;
        debug!("🗃️ Wallet {token} is now {}", if wallet.enabled { "enabled" } else { "disabled" });
        Ok(wallet)
    }

    async fn fetch_enabled_wallets(&self) -> Result<Vec<WalletAddress>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(wallets::fetch_enabled_wallets(&mut conn).await?)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_order_id(&self, order_id: &str) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_id(order_id, &mut conn).await?)
    }

    async fn fetch_order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_trade_id(trade_id, &mut conn).await?)
    }

    async fn reservation_active(&self, token: &str, amount: Amount) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reservations::reservation_active(token, amount, &mut conn).await?)
    }

    async fn insert_order_with_reservation(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let id = orders::insert_order(&order, &mut tx).await?;
        reservations::insert_reservation(&order.token, order.actual_amount, &order.trade_id, order.expires_at, &mut tx)
            .await?;
        let stored = orders::fetch_order_by_trade_id(&order.trade_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order.trade_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved with id {id}; ({}, {}) is now locked", order.trade_id, order.token, order.actual_amount);
        Ok(stored)
    }

    async fn mark_order_paid(
        &self,
        trade_id: &TradeId,
        token: &str,
        amount: Amount,
        block_transaction_id: &str,
    ) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if let Some(settled) = orders::fetch_order_by_block_transaction_id(block_transaction_id, &mut tx).await? {
            debug!(
                "🗃️ Block transaction [{block_transaction_id}] was already processed against order {}",
                settled.trade_id
            );
            return Err(PaymentGatewayError::BlockTransactionAlreadyProcessed(block_transaction_id.to_string()));
        }
        let order = orders::fetch_order_by_trade_id(trade_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(trade_id.clone()))?;
        if order.token != token || order.actual_amount != amount {
            warn!(
                "🗃️ Transfer for {trade_id} reports ({token}, {amount}) but the order was assigned ({}, {})",
                order.token, order.actual_amount
            );
        }
        let changed = orders::mark_paid(trade_id, block_transaction_id, &mut tx).await?;
        if changed == 0 {
            // Terminal states are never left, so a late transfer against a Paid or Expired order is refused.
            return Err(PaymentGatewayError::OrderNotPayable(trade_id.clone()));
        }
        // Release the order's own reservation, not the reported pair: a mismatched report must never free
        // another pending order's pair or leave this one locked forever.
        reservations::release_by_trade_id(trade_id, ReservationStatus::Released, &mut tx).await?;
        let settled = orders::fetch_order_by_trade_id(trade_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(trade_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {trade_id} marked Paid; ({}, {}) released", settled.token, settled.actual_amount);
        Ok(settled)
    }

    async fn expire_order(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let changed = orders::mark_expired(trade_id, &mut tx).await?;
        if changed == 0 {
            // Already settled, already expired, or unknown. Redelivered expiry jobs land here.
            return Ok(None);
        }
        reservations::release_by_trade_id(trade_id, ReservationStatus::Expired, &mut tx).await?;
        let expired = orders::fetch_order_by_trade_id(trade_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(trade_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {trade_id} marked Expired; ({}, {}) released", expired.token, expired.actual_amount);
        Ok(Some(expired))
    }

    async fn expire_overdue_orders(&self) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let overdue = orders::fetch_overdue_orders(Utc::now(), &mut tx).await?;
        let mut expired = Vec::with_capacity(overdue.len());
        for order in overdue {
            if orders::mark_expired(&order.trade_id, &mut tx).await? > 0 {
                reservations::release_by_trade_id(&order.trade_id, ReservationStatus::Expired, &mut tx).await?;
                if let Some(o) = orders::fetch_order_by_trade_id(&order.trade_id, &mut tx).await? {
                    expired.push(o);
                }
            }
        }
        tx.commit().await?;
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
