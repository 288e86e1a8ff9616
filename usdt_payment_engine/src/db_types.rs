//! Public data types stored by the payment gateway database.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use upg_common::Amount;

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// The lifecycle state of an order. `WaitPay` is the only non-terminal state; no transition ever leaves `Paid` or
/// `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and the gateway is waiting for the on-chain transfer.
    WaitPay,
    /// A matching on-chain transfer was confirmed and the order is settled.
    Paid,
    /// No transfer arrived before the expiry deadline.
    Expired,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::WaitPay => write!(f, "WaitPay"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WaitPay" => Ok(Self::WaitPay),
            "Paid" => Ok(Self::Paid),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to WaitPay");
            OrderStatusType::WaitPay
        })
    }
}

//--------------------------------------       TradeId       ---------------------------------------------------------
/// The gateway-internal, globally unique order identifier. Checkout URLs and expiry jobs are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TradeId(pub String);

impl FromStr for TradeId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TradeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
/// One merchant payment request, as stored. Orders are never physically deleted; terminal orders remain as an audit
/// record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub trade_id: TradeId,
    /// The merchant's own order identifier. Unique across all orders.
    pub order_id: String,
    /// The fiat amount the merchant requested.
    pub amount: Amount,
    /// The exact USDT amount the payer must send. Fixed once assigned.
    pub actual_amount: Amount,
    /// The wallet address the payer must send to.
    pub token: String,
    pub status: OrderStatusType,
    pub notify_url: String,
    pub redirect_url: Option<String>,
    /// The on-chain transaction that settled this order. Unique when set; this is the finalize idempotency guard.
    pub block_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
/// A fully validated and allocated order, ready to be written together with its reservation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub trade_id: TradeId,
    pub order_id: String,
    pub amount: Amount,
    pub actual_amount: Amount,
    pub token: String,
    pub notify_url: String,
    pub redirect_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

//--------------------------------------    WalletAddress    ---------------------------------------------------------
/// A blockchain receiving address in the shared pool. Only enabled addresses participate in allocation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletAddress {
    pub id: i64,
    pub token: String,
    pub enabled: bool,
}

//--------------------------------------  ReservationStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// The `(token, amount)` pair is held by a pending order.
    Locked,
    /// The owning order settled and the pair is free again.
    Released,
    /// The owning order expired unpaid and the pair is free again.
    Expired,
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Locked => write!(f, "Locked"),
            ReservationStatus::Released => write!(f, "Released"),
            ReservationStatus::Expired => write!(f, "Expired"),
        }
    }
}

//--------------------------------------     Reservation     ---------------------------------------------------------
/// The disambiguation unit: while `Locked`, no other pending order may hold the same `(token, amount)` pair.
/// Reservations are created and released only inside the same transaction as their owning order's state change.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub token: String,
    pub amount: Amount,
    pub trade_id: TradeId,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
