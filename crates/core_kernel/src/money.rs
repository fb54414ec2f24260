//! Decimal helpers for billing arithmetic
//!
//! Every monetary value in the engine is a `rust_decimal::Decimal`. This
//! module adds the small value types that the pricing components share:
//! billing ratios used for proration, percentages used by taxes and
//! discounts, and the rounding rules applied at the edges of a calculation.
//!
//! Intermediate results are never rounded. Final prices are rounded to cents
//! and tax amounts to six decimal places, matching what is persisted on a
//! bill item.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decimal places kept on a final price
pub const FINAL_PRICE_DP: u32 = 2;

/// Decimal places kept on a tax amount
pub const TAX_AMOUNT_DP: u32 = 6;

/// Largest difference tolerated when comparing a submitted amount with a computed one
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// Errors that can occur while building billing value types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid billing ratio {numerator}/{denominator}")]
    InvalidRatio {
        numerator: u32,
        denominator: u32,
    },

    #[error("Invalid percentage: {0}")]
    InvalidPercentage(Decimal),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A billing ratio: the fraction of a period's price charged when a product
/// is active for only part of that period
///
/// The denominator is validated at construction, so `apply` never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRatio", into = "RawRatio")]
pub struct Ratio {
    numerator: u32,
    denominator: u32,
}

#[derive(Serialize, Deserialize)]
struct RawRatio {
    numerator: u32,
    denominator: u32,
}

impl TryFrom<RawRatio> for Ratio {
    type Error = MoneyError;

    fn try_from(raw: RawRatio) -> Result<Self, Self::Error> {
        Ratio::new(raw.numerator, raw.denominator)
    }
}

impl From<Ratio> for RawRatio {
    fn from(ratio: Ratio) -> Self {
        RawRatio {
            numerator: ratio.numerator,
            denominator: ratio.denominator,
        }
    }
}

impl Ratio {
    /// The whole period
    pub const FULL: Ratio = Ratio { numerator: 1, denominator: 1 };

    /// Creates a ratio
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidRatio` when the denominator is zero or the
    /// fraction exceeds one.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, MoneyError> {
        if denominator == 0 || numerator > denominator {
            return Err(MoneyError::InvalidRatio { numerator, denominator });
        }
        Ok(Self { numerator, denominator })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Returns true when the ratio charges the full period
    pub fn is_full(&self) -> bool {
        self.numerator == self.denominator
    }

    /// Returns the ratio as a decimal fraction
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.numerator) / Decimal::from(self.denominator)
    }

    /// Applies the ratio to an amount: `amount * numerator / denominator`
    ///
    /// Multiplication happens before division so that exact fractions such as
    /// `300 * 1 / 2` stay exact.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        if self.is_full() {
            return amount;
        }
        amount * Decimal::from(self.numerator) / Decimal::from(self.denominator)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A non-negative percentage expressed in whole units (20 means 20%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(Decimal);

impl Percentage {
    /// Creates a percentage
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidPercentage` for negative values
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::InvalidPercentage(value));
        }
        Ok(Self(value))
    }

    /// Returns the percentage value (20 for 20%)
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the percentage as a fraction (0.2 for 20%)
    pub fn as_fraction(&self) -> Decimal {
        self.0 / dec!(100)
    }

    /// Returns `amount * value / 100`
    pub fn of(&self, amount: Decimal) -> Decimal {
        amount * self.0 / dec!(100)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

/// Rounds an amount to cents, half away from zero
pub fn round_final_price(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(FINAL_PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a tax amount to six decimal places, half away from zero
pub fn round_tax_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(TAX_AMOUNT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true when two amounts differ by less than [`AMOUNT_TOLERANCE`]
pub fn amounts_match(left: Decimal, right: Decimal) -> bool {
    (left - right).abs() < AMOUNT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_rejects_zero_denominator() {
        assert_eq!(
            Ratio::new(1, 0),
            Err(MoneyError::InvalidRatio { numerator: 1, denominator: 0 })
        );
    }

    #[test]
    fn test_ratio_rejects_fraction_above_one() {
        assert!(Ratio::new(3, 2).is_err());
    }

    #[test]
    fn test_ratio_apply_is_exact() {
        let half = Ratio::new(1, 2).unwrap();
        assert_eq!(half.apply(dec!(300)), dec!(150));

        let third = Ratio::new(1, 3).unwrap();
        assert_eq!(round_final_price(third.apply(dec!(100))), dec!(33.33));
    }

    #[test]
    fn test_full_ratio_is_noop() {
        assert!(Ratio::FULL.is_full());
        assert_eq!(Ratio::FULL.apply(dec!(123.456)), dec!(123.456));
        assert!(Ratio::new(4, 4).unwrap().is_full());
    }

    #[test]
    fn test_ratio_deserialize_validates() {
        let bad = serde_json::from_str::<Ratio>(r#"{"numerator":1,"denominator":0}"#);
        assert!(bad.is_err());

        let good: Ratio = serde_json::from_str(r#"{"numerator":1,"denominator":4}"#).unwrap();
        assert_eq!(good, Ratio::new(1, 4).unwrap());
    }

    #[test]
    fn test_percentage_of() {
        let pct = Percentage::new(dec!(20)).unwrap();
        assert_eq!(pct.of(dec!(100)), dec!(20));
        assert_eq!(pct.as_fraction(), dec!(0.2));
        assert!(Percentage::new(dec!(-1)).is_err());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_final_price(dec!(10.005)), dec!(10.01));
        assert_eq!(round_final_price(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round_tax_amount(dec!(16.6666666666)), dec!(16.666667));
    }

    #[test]
    fn test_amounts_match_tolerance() {
        assert!(amounts_match(dec!(83.333336), dec!(83.333333)));
        assert!(!amounts_match(dec!(100), dec!(100.02)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ratio_never_exceeds_amount(
            cents in 0i64..10_000_000i64,
            denominator in 1u32..365u32,
            numerator_seed in 0u32..365u32,
        ) {
            let numerator = numerator_seed % (denominator + 1);
            let ratio = Ratio::new(numerator, denominator).unwrap();
            let amount = Decimal::new(cents, 2);

            let applied = ratio.apply(amount);
            prop_assert!(applied <= amount);
            prop_assert!(applied >= Decimal::ZERO);
        }

        #[test]
        fn full_ratio_is_identity(cents in -10_000_000i64..10_000_000i64) {
            let amount = Decimal::new(cents, 2);
            prop_assert_eq!(Ratio::FULL.apply(amount), amount);
        }
    }
}
