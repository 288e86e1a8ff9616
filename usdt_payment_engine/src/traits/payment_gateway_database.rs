use thiserror::Error;
use upg_common::Amount;

use crate::{
    db_types::{NewOrder, Order, TradeId},
    traits::WalletManagement,
};

/// This trait defines the highest level of behaviour for backends supporting the USDT Payment Engine.
///
/// This behaviour includes:
/// * The order store: durable order records and their monotonic status transitions.
/// * The reservation ledger: the single source of truth for which `(token, amount)` pairs are currently held by
///   pending orders. The ledger is only ever written inside the same transaction as its owning order.
/// * The expiry sweep that backstops the external delayed-job facility.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + WalletManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Fetches the order with the given merchant order id, if any.
    async fn fetch_order_by_order_id(&self, order_id: &str) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the order with the given trade id, if any.
    async fn fetch_order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Reservation ledger query: is there an active (`Locked`) reservation for `(token, amount)`?
    ///
    /// The allocator probes this during order creation. Callers must hold the creation barrier for the
    /// query-then-reserve sequence to be race-free; the partial unique index on the ledger is the store-level
    /// guard of last resort.
    async fn reservation_active(&self, token: &str, amount: Amount) -> Result<bool, PaymentGatewayError>;

    /// In a single atomic transaction, inserts the order row in `WaitPay` status and creates the `Locked`
    /// reservation for its `(token, actual_amount)` pair. Both writes commit or both roll back.
    ///
    /// Returns the stored order.
    async fn insert_order_with_reservation(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    /// In a single atomic transaction:
    /// * rejects with [`PaymentGatewayError::BlockTransactionAlreadyProcessed`] if any order has already settled
    ///   against `block_transaction_id` (the idempotency guard for redelivered chain events),
    /// * marks the order `Paid`, recording `block_transaction_id`,
    /// * releases the order's own reservation. A reported `(token, amount)` that mismatches the order's assigned
    ///   pair is logged but never frees another order's reservation.
    ///
    /// Returns the settled order.
    async fn mark_order_paid(
        &self,
        trade_id: &TradeId,
        token: &str,
        amount: Amount,
        block_transaction_id: &str,
    ) -> Result<Order, PaymentGatewayError>;

    /// In a single atomic transaction, marks the order `Expired` if it is still `WaitPay` and flips its reservation
    /// from `Locked` to `Expired`.
    ///
    /// Idempotent: if the order is already terminal (or unknown) nothing changes and `None` is returned, so the
    /// at-least-once expiry job may redeliver freely.
    async fn expire_order(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Expires every `WaitPay` order whose deadline has passed, releasing its reservation. Returns the orders that
    /// were expired.
    ///
    /// This is the periodic backstop for expiry jobs that were never scheduled or never delivered; an order must
    /// eventually release its `(token, amount)` pair even if the scheduling call at creation time failed.
    async fn expire_overdue_orders(&self) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The fiat or converted USDT amount is below the minimum payment threshold")]
    PaymentAmountTooSmall,
    #[error("Cannot insert order, since merchant order id {0} already exists")]
    OrderAlreadyExists(String),
    #[error("The enabled wallet address pool is empty")]
    NoAvailableWallet,
    #[error("No free (address, amount) pair found within the allocation attempt budget")]
    NoAvailableAmount,
    #[error("The requested order {0} does not exist")]
    OrderNotFound(TradeId),
    #[error("An order has already been settled against block transaction {0}")]
    BlockTransactionAlreadyProcessed(String),
    #[error("Order {0} is terminal and can no longer be settled")]
    OrderNotPayable(TradeId),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
