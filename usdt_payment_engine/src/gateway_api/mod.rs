//! The engine public API.
//!
//! [`order_flow_api::OrderFlowApi`] is what external collaborators call: the network boundary submits new orders,
//! the chain monitor submits confirmed transfers, and the delayed-job facility calls back for expiry. The other
//! modules hold the supporting pieces: rate conversion, the wallet-pool allocator and the request/response objects.
pub mod exchange_objects;
pub mod order_flow_api;
pub mod order_objects;
pub mod wallet_pool;
