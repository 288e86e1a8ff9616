use std::fmt::Debug;

use chrono::Utc;
use log::*;
use tokio::sync::Mutex;
use upg_common::Amount;

use crate::{
    config::PaymentGatewayConfig,
    db_types::{NewOrder, Order, TradeId},
    events::{EventProducers, OrderEvent},
    gateway_api::{
        exchange_objects::ExchangeRate,
        order_objects::{CheckoutSummary, OrderRequest},
        wallet_pool,
    },
    helpers,
    traits::{ExpiryScheduler, PaymentGatewayDatabase, PaymentGatewayError},
};

/// `OrderFlowApi` is the primary API for the settlement core: order creation in response to merchant requests,
/// finalization in response to confirmed on-chain transfers, and expiry in response to delayed-job callbacks.
///
/// Order creation is serialized through an internal barrier so that the allocator's query-then-reserve sequence
/// never races with another allocation. Finalization and expiry are not serialized by that barrier: they act on an
/// already-identified order and rely on the store's transactional atomicity, so they proceed concurrently with
/// each other and with creation.
pub struct OrderFlowApi<B, S> {
    db: B,
    config: PaymentGatewayConfig,
    scheduler: S,
    producers: EventProducers,
    creation_lock: Mutex<()>,
}

impl<B, S> Debug for OrderFlowApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, S> OrderFlowApi<B, S> {
    pub fn new(db: B, config: PaymentGatewayConfig, scheduler: S) -> Self {
        Self { db, config, scheduler, producers: EventProducers::new(), creation_lock: Mutex::new(()) }
    }

    /// Attach an order-event subscriber. The webhook notifier collaborator hooks in here.
    pub fn producers_mut(&mut self) -> &mut EventProducers {
        &mut self.producers
    }

    pub fn config(&self) -> &PaymentGatewayConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, S> OrderFlowApi<B, S>
where
    B: PaymentGatewayDatabase,
    S: ExpiryScheduler,
{
    /// Creates a new payment order.
    ///
    /// The fiat amount is converted to USDT at the configured rate (or the request's override when positive), the
    /// wallet pool allocator picks an unreserved `(token, amount)` pair, and the order row and its reservation are
    /// written in one transaction. The whole sequence runs under the creation barrier.
    ///
    /// After the commit, an expiry job is scheduled for the trade id. If scheduling fails the order is still
    /// guaranteed to expire: the periodic sweep ([`crate::scheduler::start_expiry_sweep`]) releases overdue
    /// reservations, so a lost job only delays the release.
    ///
    /// ## Failure modes
    /// * `PaymentAmountTooSmall` — fiat or converted USDT amount below the configured minimum.
    /// * `OrderAlreadyExists` — the merchant order id was used before.
    /// * `NoAvailableWallet` — the enabled wallet pool is empty.
    /// * `NoAvailableAmount` — the allocator exhausted its attempt budget on the chosen wallet.
    pub async fn create_order(&self, req: OrderRequest) -> Result<CheckoutSummary, PaymentGatewayError> {
        let _guard = self.creation_lock.lock().await;
        let rate = match req.rate {
            Some(rate) if rate.is_positive() => ExchangeRate::new(rate, None),
            _ => ExchangeRate::new(self.config.usdt_rate, None),
        };
        let usdt_amount = rate.convert(req.amount);
        if req.amount < self.config.min_fiat_amount || usdt_amount < self.config.min_usdt_amount {
            debug!("🔄️📦️ Rejecting order [{}]: {} fiat / {usdt_amount} USDT is below the minimum", req.order_id, req.amount);
            return Err(PaymentGatewayError::PaymentAmountTooSmall);
        }
        if self.db.fetch_order_by_order_id(&req.order_id).await?.is_some() {
            debug!("🔄️📦️ Rejecting order [{}]: merchant order id already exists", req.order_id);
            return Err(PaymentGatewayError::OrderAlreadyExists(req.order_id));
        }
        let wallets = self.db.fetch_enabled_wallets().await?;
        if wallets.is_empty() {
            warn!("🔄️📦️ Rejecting order [{}]: the enabled wallet pool is empty", req.order_id);
            return Err(PaymentGatewayError::NoAvailableWallet);
        }
        let (token, actual_amount) =
            wallet_pool::allocate(&self.db, usdt_amount, &wallets, req.preferred_token.as_deref()).await?;
        let trade_id = helpers::new_trade_id();
        let expires_at = Utc::now() + self.config.order_expiry;
        let order = self
            .db
            .insert_order_with_reservation(NewOrder {
                trade_id: trade_id.clone(),
                order_id: req.order_id,
                amount: req.amount,
                actual_amount,
                token,
                notify_url: req.notify_url,
                redirect_url: req.redirect_url,
                expires_at,
            })
            .await?;
        drop(_guard);
        debug!("🔄️📦️ Order {trade_id} created: {actual_amount} USDT on wallet {}", order.token);
        if let Err(e) = self.scheduler.schedule_expiry(trade_id.clone(), self.config.order_expiry).await {
            // The reservation is already committed. The sweep backstop guarantees its eventual release.
            warn!("⏲️ Could not schedule the expiry job for {trade_id}: {e}. The sweep will release it instead.");
        }
        Ok(CheckoutSummary::new(&order, &self.config.app_base_uri))
    }

    /// Settles an order against a confirmed on-chain transfer.
    ///
    /// Called by the chain-monitor collaborator, possibly more than once for the same transfer. The first call
    /// marks the order `Paid` and releases its reservation in one transaction; redeliveries fail with
    /// `BlockTransactionAlreadyProcessed` and change nothing. The engine never retries internally; retrying is the
    /// monitor's job, made safe by that guard.
    pub async fn finalize_order(
        &self,
        token: &str,
        amount: Amount,
        trade_id: &TradeId,
        block_transaction_id: &str,
    ) -> Result<Order, PaymentGatewayError> {
        let order = self.db.mark_order_paid(trade_id, token, amount, block_transaction_id).await?;
        info!("🔄️💰️ Order {trade_id} settled by block transaction [{block_transaction_id}]");
        self.producers.publish(&OrderEvent::Paid(order.clone()));
        Ok(order)
    }

    /// Expiry callback for the delayed-job facility. Safe to invoke any number of times: once the order has left
    /// `WaitPay` this is a no-op returning `None`.
    pub async fn expire_order(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError> {
        let expired = self.db.expire_order(trade_id).await?;
        if let Some(order) = &expired {
            info!("🔄️⏲️ Order {trade_id} expired unpaid; reservation for ({}, {}) released", order.token, order.actual_amount);
            self.producers.publish(&OrderEvent::Expired(order.clone()));
        }
        Ok(expired)
    }

    /// Fetches the order for a checkout page.
    pub async fn order_by_trade_id(&self, trade_id: &TradeId) -> Result<Order, PaymentGatewayError> {
        self.db
            .fetch_order_by_trade_id(trade_id)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(trade_id.clone()))
    }
}
