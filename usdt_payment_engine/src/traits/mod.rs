//! Behaviour contracts for payment gateway backends.
//!
//! * [`PaymentGatewayDatabase`] defines the order store and reservation ledger behaviour the engine is built on.
//!   All multi-row mutations it describes are atomic: either every write commits or none do.
//! * [`WalletManagement`] defines the shared wallet-address pool.
//! * [`ExpiryScheduler`] is the capability interface for the external delayed-job facility that fires order expiry.
mod expiry_scheduler;
mod payment_gateway_database;
mod wallet_management;

pub use expiry_scheduler::ExpiryScheduler;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use wallet_management::WalletManagement;
