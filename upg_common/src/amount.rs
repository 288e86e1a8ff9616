use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of fractional decimal digits carried by [`Amount`].
const DECIMALS: u32 = 4;
/// Scale factor between whole currency units and raw units (10^DECIMALS).
const SCALE: i64 = 10_000;

//--------------------------------------      Amount       -----------------------------------------------------------
/// A fixed-point monetary amount with 4 fractional digits.
///
/// One raw unit is 0.0001 of the currency. All monetary values in the gateway (fiat prices, USDT amounts and
/// exchange rates) use this representation so that reservation-key equality and threshold comparisons are exact.
/// Binary floating point is never used for money.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Mul<i64> for Amount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a 4dp fixed-point amount: {0}")]
pub struct AmountConversionError(String);

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:04}", abs / SCALE as u64, abs % SCALE as u64)
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    /// Parses a plain decimal string, rounding half-up past the 4th fractional digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountConversionError(s.to_string()));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountConversionError(s.to_string()));
        }
        let whole = if int_part.is_empty() {
            0i64
        } else {
            int_part.parse::<i64>().map_err(|_| AmountConversionError(s.to_string()))?
        };
        let mut frac = 0i64;
        for b in frac_part.bytes().take(DECIMALS as usize) {
            frac = frac * 10 + i64::from(b - b'0');
        }
        frac *= 10i64.pow(DECIMALS - frac_part.len().min(DECIMALS as usize) as u32);
        if frac_part.len() > DECIMALS as usize && frac_part.as_bytes()[DECIMALS as usize] >= b'5' {
            frac += 1;
        }
        let raw = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| AmountConversionError(s.to_string()))?;
        Ok(Self(if negative { -raw } else { raw }))
    }
}

impl Amount {
    /// The smallest representable increment, 0.0001.
    pub const INCREMENT: Amount = Amount(1);

    /// Builds an amount directly from raw units (ten-thousandths).
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Builds an amount from whole currency units.
    pub const fn from_whole(units: i64) -> Self {
        Self(units * SCALE)
    }

    /// The amount in raw units (ten-thousandths).
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Divides `self` by `rate`, rounding half-up to 4 fractional digits.
    ///
    /// `rate` must be positive; callers validate rates before converting.
    pub fn div_round(self, rate: Amount) -> Amount {
        debug_assert!(rate.0 > 0, "exchange rates must be positive");
        let numerator = i128::from(self.0) * i128::from(SCALE);
        let divisor = i128::from(rate.0);
        let quotient = (numerator + divisor / 2) / divisor;
        #[allow(clippy::cast_possible_truncation)]
        Amount(quotient as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_plain_decimals() {
        assert_eq!("10.00".parse::<Amount>().unwrap(), Amount::from_raw(100_000));
        assert_eq!("0.0001".parse::<Amount>().unwrap(), Amount::INCREMENT);
        assert_eq!("7.2".parse::<Amount>().unwrap(), Amount::from_raw(72_000));
        assert_eq!("42".parse::<Amount>().unwrap(), Amount::from_whole(42));
        assert_eq!("-1.5".parse::<Amount>().unwrap(), Amount::from_raw(-15_000));
        assert_eq!(".25".parse::<Amount>().unwrap(), Amount::from_raw(2_500));
    }

    #[test]
    fn parse_rounds_half_up_past_four_digits() {
        assert_eq!("1.38885".parse::<Amount>().unwrap(), Amount::from_raw(13_889));
        assert_eq!("1.38884".parse::<Amount>().unwrap(), Amount::from_raw(13_888));
        assert_eq!("0.00005".parse::<Amount>().unwrap(), Amount::INCREMENT);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!(".".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
        assert!("12a".parse::<Amount>().is_err());
    }

    #[test]
    fn display_four_digits() {
        assert_eq!(Amount::from_raw(13_889).to_string(), "1.3889");
        assert_eq!(Amount::from_whole(10).to_string(), "10.0000");
        assert_eq!(Amount::from_raw(-15_000).to_string(), "-1.5000");
        assert_eq!(Amount::from_raw(5).to_string(), "0.0005");
    }

    #[test]
    fn division_rounds_half_up() {
        // 10.00 CNY at 7.2 CNY/USDT => 1.3889 USDT
        let fiat = Amount::from_whole(10);
        let rate = "7.2".parse::<Amount>().unwrap();
        assert_eq!(fiat.div_round(rate), Amount::from_raw(13_889));
        // 1.00 / 3.00 => 0.3333
        assert_eq!(Amount::from_whole(1).div_round(Amount::from_whole(3)), Amount::from_raw(3_333));
        // 0.50 / 4.00 => 0.1250 exactly
        assert_eq!(Amount::from_raw(5_000).div_round(Amount::from_whole(4)), Amount::from_raw(1_250));
    }

    #[test]
    fn arithmetic() {
        let a = Amount::from_raw(13_889);
        assert_eq!(a + Amount::INCREMENT, Amount::from_raw(13_890));
        assert_eq!(a - Amount::from_raw(889), Amount::from_raw(13_000));
        assert_eq!(a * 2, Amount::from_raw(27_778));
        assert_eq!(-a, Amount::from_raw(-13_889));
        let total: Amount = [a, Amount::INCREMENT].into_iter().sum();
        assert_eq!(total, Amount::from_raw(13_890));
    }
}
