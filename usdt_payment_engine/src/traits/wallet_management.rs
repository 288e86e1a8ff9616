use crate::{db_types::WalletAddress, traits::PaymentGatewayError};

/// Management of the shared pool of receiving wallet addresses.
///
/// Disabled addresses stay in the table (their history is still referenced by orders) but never take part in
/// allocation.
#[allow(async_fn_in_trait)]
pub trait WalletManagement {
    /// Adds the wallet address to the pool, or updates its enabled flag if it is already present.
    async fn upsert_wallet(&self, token: &str, enabled: bool) -> Result<WalletAddress, PaymentGatewayError>;

    /// Fetches every enabled wallet address, in insertion order.
    async fn fetch_enabled_wallets(&self) -> Result<Vec<WalletAddress>, PaymentGatewayError>;
}
