//! USDT Payment Engine
//!
//! The USDT Payment Engine is the settlement core of a stablecoin payment gateway. It converts a merchant-supplied
//! fiat amount into a USDT amount, assigns that amount to one of a shared pool of wallet addresses so that an
//! independent chain watcher can later re-identify the paying order purely from the `(address, amount)` pair it
//! observes on-chain, reserves that pair against double-use for the lifetime of the order, and finalizes or expires
//! the order afterwards.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types stored in the database, which are defined in [`mod@db_types`] and are public.
//! 2. The backend contracts ([`mod@traits`]). Backends implement [`PaymentGatewayDatabase`] (which includes the
//!    reservation ledger) in order to drive the engine.
//! 3. The engine public API ([`mod@gateway_api`]). [`OrderFlowApi`] is the entry point the network boundary and the
//!    chain-monitor collaborator call into: order creation, finalization and expiry.
//!
//! Order expiration is delegated to an [`traits::ExpiryScheduler`] with at-least-once delivery; the expiry path is
//! idempotent so redelivery is harmless. A periodic sweep ([`scheduler::start_expiry_sweep`]) backstops lost jobs.
pub mod config;
pub mod db_types;
pub mod events;
pub mod gateway_api;
pub mod helpers;
pub mod scheduler;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use gateway_api::{
    exchange_objects::ExchangeRate,
    order_flow_api::OrderFlowApi,
    order_objects::{CheckoutSummary, OrderRequest},
};
pub use traits::{ExpiryScheduler, PaymentGatewayDatabase, PaymentGatewayError, WalletManagement};
