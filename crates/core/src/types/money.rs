//! Exact money arithmetic in minor currency units.
//!
//! All internal price math happens on integer cents to avoid floating-point
//! rounding drift. Conversion to major units ([`Cents::to_major`]) is a
//! presentation concern and must only happen at the display boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error converting a major-unit amount into cents.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),

    /// The amount does not fit in an i64 cent count.
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// An amount of money in minor currency units (e.g. cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw cent count.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Get the raw cent count.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Checked addition, `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Whether this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert to a major-unit decimal (e.g. `1999` -> `19.99`).
    #[must_use]
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Convert a major-unit decimal into cents, rounding to the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative amounts and
    /// [`MoneyError::OutOfRange`] for amounts that do not fit in `i64` cents.
    pub fn from_major(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }

        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|scaled| scaled.round())
            .and_then(|scaled| scaled.to_i64())
            .map(Self)
            .ok_or(MoneyError::OutOfRange(amount))
    }
}

impl std::fmt::Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_to_major() {
        assert_eq!(Cents::new(1999).to_major(), Decimal::new(1999, 2));
        assert_eq!(Cents::new(1999).to_string(), "19.99");
        assert_eq!(Cents::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_from_major_rounds_to_nearest_cent() {
        let amount = Decimal::from_str("19.99").unwrap();
        assert_eq!(Cents::from_major(amount), Ok(Cents::new(1999)));

        // Sub-cent precision rounds rather than truncates.
        let amount = Decimal::from_str("10.005").unwrap();
        assert_eq!(Cents::from_major(amount), Ok(Cents::new(1000)));
    }

    #[test]
    fn test_from_major_rejects_negative() {
        let amount = Decimal::from_str("-1.00").unwrap();
        assert_eq!(Cents::from_major(amount), Err(MoneyError::Negative(amount)));
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(
            Cents::new(i64::MAX).checked_add(Cents::new(1)),
            None,
        );
        assert_eq!(
            Cents::new(1).checked_add(Cents::new(2)),
            Some(Cents::new(3)),
        );
    }

    #[test]
    fn test_sum() {
        let total: Cents = [Cents::new(100), Cents::new(250), Cents::new(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Cents::new(351));
    }
}
