//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Used for tax rates and derived ratios (ROI, profit per unit). Coin amounts
//! themselves are whole numbers and stay `i64`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for ratio calculations.
///
/// Serializes to JSON number (not string).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Build `num / 10^scale` exactly, e.g. `from_parts(2, 2)` is 0.02.
    pub fn from_parts(num: i64, scale: u32) -> Self {
        Decimal(RustDecimal::new(num, scale))
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// `numerator / denominator`, or `None` when the denominator is zero.
    pub fn ratio(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        RustDecimal::from(numerator)
            .checked_div(RustDecimal::from(denominator))
            .map(Decimal)
    }

    /// Multiply a whole amount and round toward negative infinity.
    ///
    /// Returns `None` if the product does not fit in an `i64`.
    pub fn floor_mul(&self, amount: i64) -> Option<i64> {
        RustDecimal::from(amount)
            .checked_mul(self.0)
            .and_then(|product| product.floor().to_i64())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

/// Lossless parse; no float round-trip.
impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RustDecimal::from_str(s).map(Decimal)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parse_roundtrip() {
        for s in ["0.01", "0.02", "-12.5", "0", "1000000"] {
            let decimal: Decimal = s.parse().expect("parse failed");
            let reparsed: Decimal = decimal.to_canonical_string().parse().expect("reparse");
            assert_eq!(decimal, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_ratio_zero_denominator_is_none() {
        assert_eq!(Decimal::ratio(10, 0), None);
        assert_eq!(Decimal::ratio(1, 4).unwrap().to_canonical_string(), "0.25");
    }

    #[test]
    fn test_floor_mul() {
        let rate = Decimal::from_parts(1, 2);
        assert_eq!(rate.floor_mul(199), Some(1));
        assert_eq!(rate.floor_mul(99), Some(0));
        let rate = Decimal::from_parts(2, 2);
        assert_eq!(rate.floor_mul(1_000), Some(20));
    }

    #[test]
    fn test_decimal_json_serialization() {
        let decimal: Decimal = "0.125".parse().unwrap();
        let json = serde_json::to_value(decimal).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "0.125");
    }
}
