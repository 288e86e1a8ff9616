use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upg_common::Amount;

/// A fiat-per-USDT exchange rate.
///
/// The rate is a fixed-point amount: how much fiat buys one USDT. Conversion is pure computation with no side
/// effects; rounding is half-up to 4 fractional digits, never binary floating point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub rate: Amount,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(rate: Amount, updated_at: Option<DateTime<Utc>>) -> Self {
        let updated_at = updated_at.unwrap_or_else(Utc::now);
        Self { rate, updated_at }
    }

    /// A 1:1 rate.
    pub fn parity() -> Self {
        Self::new(Amount::from_whole(1), None)
    }

    /// Converts a fiat amount into USDT, rounding half-up to 4 decimal places.
    pub fn convert(&self, fiat: Amount) -> Amount {
        fiat.div_round(self.rate)
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} => 1 USDT", self.rate)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self::parity()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exchange_rate() {
        // 1:1 exchange rate
        let rate = ExchangeRate::default();
        assert_eq!(rate.convert(Amount::from_whole(5)), Amount::from_whole(5));
        assert_eq!(format!("{rate}"), "1.0000 => 1 USDT");

        // 10.00 fiat at 7.2 => 1.3889 USDT, rounded half-up at the 4th digit
        let rate = ExchangeRate::new("7.2".parse().unwrap(), None);
        assert_eq!(rate.convert(Amount::from_whole(10)), Amount::from_raw(13_889));

        // 0.01 fiat at 7.2 => 0.0014
        assert_eq!(rate.convert("0.01".parse().unwrap()), Amount::from_raw(14));

        // 1.00 at 6.4 => 0.15625 => 0.1563
        let rate = ExchangeRate::new("6.4".parse().unwrap(), None);
        assert_eq!(rate.convert(Amount::from_whole(1)), Amount::from_raw(1_563));
    }
}
