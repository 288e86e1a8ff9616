//! The wallet-pool allocator.
//!
//! Given a target USDT amount and the enabled wallet pool, the allocator finds a `(token, amount)` pair with no
//! active reservation. The pair is the only signal the chain watcher has to re-identify the paying order, so it
//! must be unique among all simultaneously pending orders.
//!
//! The amount is perturbed by a random jitter of 5 to 95 ten-thousandths, computed once per allocation, and then
//! linearly probed upwards in 0.0001 steps until a free slot is found or the attempt budget runs out. The jitter
//! spreads concurrent orders on a popular nominal price across the amount space, so first-attempt collisions are
//! rare; the linear probe bounds the drift from the requested amount to at most 0.01 USDT.
//!
//! One wallet address is chosen per allocation and kept for every attempt: a preferred or randomly chosen address
//! is sticky for its order, with no fallback to a different address on exhaustion.
//!
//! Callers must hold the order-creation barrier: the ledger query and the subsequent reservation insert are a
//! check-then-act sequence.

use log::debug;
use rand::Rng;
use upg_common::Amount;

use crate::{
    db_types::WalletAddress,
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

/// Step between consecutive candidate amounts: 0.0001 USDT.
pub const AMOUNT_INCREMENT: Amount = Amount::INCREMENT;
/// How many candidate amounts are probed before giving up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 100;
/// Jitter bounds, in raw units (ten-thousandths): 0.0005 to 0.0095 inclusive.
pub const JITTER_MIN: i64 = 5;
pub const JITTER_MAX: i64 = 95;

/// Finds an unreserved `(token, amount)` pair for `desired_amount`, or fails with `NoAvailableAmount` once the
/// attempt budget is exhausted. An empty pool fails with `NoAvailableWallet`.
pub async fn allocate<B: PaymentGatewayDatabase>(
    db: &B,
    desired_amount: Amount,
    wallets: &[WalletAddress],
    preferred_token: Option<&str>,
) -> Result<(String, Amount), PaymentGatewayError> {
    if wallets.is_empty() {
        return Err(PaymentGatewayError::NoAvailableWallet);
    }
    let index = starting_index(wallets, preferred_token);
    let token = wallets[index].token.as_str();
    let mut candidate = desired_amount + jitter();
    for _ in 0..MAX_ALLOCATION_ATTEMPTS {
        if !db.reservation_active(token, candidate).await? {
            debug!("🧮️ Allocated {candidate} on wallet {token} for a desired amount of {desired_amount}");
            return Ok((token.to_string(), candidate));
        }
        candidate = candidate + AMOUNT_INCREMENT;
    }
    debug!("🧮️ Wallet {token} has no free amount near {desired_amount} within {MAX_ALLOCATION_ATTEMPTS} attempts");
    Err(PaymentGatewayError::NoAvailableAmount)
}

/// Chooses the wallet index for this allocation. A known preferred token wins; otherwise, or when the preferred
/// token is not in the pool, a uniformly random wallet is used.
fn starting_index(wallets: &[WalletAddress], preferred_token: Option<&str>) -> usize {
    preferred_token
        .and_then(|token| wallets.iter().position(|w| w.token == token))
        .unwrap_or_else(|| rand::thread_rng().gen_range(0..wallets.len()))
}

/// The randomized fractional offset added to the desired amount, computed once per allocation.
fn jitter() -> Amount {
    Amount::from_raw(rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX))
}
