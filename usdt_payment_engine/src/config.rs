//! Engine configuration.
//!
//! All values come from the environment with logged fallbacks to defaults, so a bare deployment starts with sane
//! settings. The allocator's increment step, jitter range and attempt budget are fixed constants in
//! [`crate::gateway_api::wallet_pool`], not configuration.

use std::env;

use chrono::Duration;
use log::*;
use upg_common::Amount;

const DEFAULT_USDT_RATE: Amount = Amount::from_raw(72_000); // 7.2 fiat per USDT
const DEFAULT_MIN_FIAT_AMOUNT: Amount = Amount::from_raw(100); // 0.01
const DEFAULT_MIN_USDT_AMOUNT: Amount = Amount::from_raw(100); // 0.01
const DEFAULT_ORDER_EXPIRY_MINUTES: i64 = 15;
const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 60;
const DEFAULT_APP_BASE_URI: &str = "http://127.0.0.1:8360";

#[derive(Clone, Debug)]
pub struct PaymentGatewayConfig {
    /// The process-wide fiat-per-USDT exchange rate, used when a request carries no valid rate override.
    pub usdt_rate: Amount,
    /// Requests whose fiat amount rounds below this fail with `PaymentAmountTooSmall`.
    pub min_fiat_amount: Amount,
    /// Requests whose converted USDT amount falls below this fail with `PaymentAmountTooSmall`.
    pub min_usdt_amount: Amount,
    /// How long an unpaid order holds its reservation before it expires.
    pub order_expiry: Duration,
    /// How often the backstop sweep looks for overdue orders.
    pub sweep_interval: Duration,
    /// Base URI used to build checkout-page URLs.
    pub app_base_uri: String,
}

impl Default for PaymentGatewayConfig {
    fn default() -> Self {
        Self {
            usdt_rate: DEFAULT_USDT_RATE,
            min_fiat_amount: DEFAULT_MIN_FIAT_AMOUNT,
            min_usdt_amount: DEFAULT_MIN_USDT_AMOUNT,
            order_expiry: Duration::minutes(DEFAULT_ORDER_EXPIRY_MINUTES),
            sweep_interval: Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS),
            app_base_uri: DEFAULT_APP_BASE_URI.to_string(),
        }
    }
}

impl PaymentGatewayConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let usdt_rate = amount_from_env("UPG_USDT_RATE", defaults.usdt_rate);
        let min_fiat_amount = amount_from_env("UPG_MIN_FIAT_AMOUNT", defaults.min_fiat_amount);
        let min_usdt_amount = amount_from_env("UPG_MIN_USDT_AMOUNT", defaults.min_usdt_amount);
        let order_expiry = env::var("UPG_ORDER_EXPIRY_MINUTES")
            .ok()
            .and_then(|s| match s.parse::<i64>() {
                Ok(m) if m > 0 => Some(Duration::minutes(m)),
                _ => {
                    error!("🪛️ {s} is not a valid value for UPG_ORDER_EXPIRY_MINUTES. Using the default instead.");
                    None
                },
            })
            .unwrap_or(defaults.order_expiry);
        let sweep_interval = env::var("UPG_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| match s.parse::<i64>() {
                Ok(secs) if secs > 0 => Some(Duration::seconds(secs)),
                _ => {
                    error!("🪛️ {s} is not a valid value for UPG_SWEEP_INTERVAL_SECS. Using the default instead.");
                    None
                },
            })
            .unwrap_or(defaults.sweep_interval);
        let app_base_uri = env::var("UPG_APP_BASE_URI")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.app_base_uri);
        Self { usdt_rate, min_fiat_amount, min_usdt_amount, order_expiry, sweep_interval, app_base_uri }
    }
}

fn amount_from_env(var: &str, default: Amount) -> Amount {
    match env::var(var) {
        Ok(s) => match s.parse::<Amount>() {
            Ok(a) if a.is_positive() => a,
            _ => {
                error!("🪛️ {s} is not a valid positive amount for {var}. Using the default, {default}, instead.");
                default
            },
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = PaymentGatewayConfig::default();
        assert_eq!(config.usdt_rate, "7.2".parse().unwrap());
        assert_eq!(config.min_fiat_amount, "0.01".parse().unwrap());
        assert_eq!(config.min_usdt_amount, "0.01".parse().unwrap());
        assert_eq!(config.order_expiry, Duration::minutes(15));
        assert!(!config.app_base_uri.ends_with('/'));
    }
}
