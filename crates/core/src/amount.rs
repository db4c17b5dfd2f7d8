//! Amount - Non-negative decimal wrapper for monetary values
//!
//! Every premium, fee, payout and balance in Surety is an `Amount`.
//! Values are whole currency units with at most [`AMOUNT_SCALE`] fractional
//! digits; the last digit is the smallest unit the system can move.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fractional digits carried by an amount (1 unit = 10^18 smallest units)
pub const AMOUNT_SCALE: u32 = 18;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount {value} has more than {max_scale} fractional digits")]
    TooPrecise { value: Decimal, max_scale: u32 },
}

/// A non-negative decimal amount.
///
/// # Invariant
/// The inner value is always >= 0 and carries at most [`AMOUNT_SCALE`]
/// fractional digits. Both are enforced by the constructor.
///
/// # Example
/// ```
/// use surety_core::Amount;
/// use rust_decimal::Decimal;
///
/// let premium = Amount::new(Decimal::new(5, 1)).unwrap(); // 0.5
/// let payout = premium.mul_ratio_floor(3, 2).unwrap();
/// assert_eq!(payout.value(), Decimal::new(75, 2));
///
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NegativeAmount(value));
        }
        if value.normalize().scale() > AMOUNT_SCALE {
            return Err(AmountError::TooPrecise {
                value,
                max_scale: AMOUNT_SCALE,
            });
        }
        Ok(Self(value))
    }

    /// Whole currency units
    pub fn units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Amount from a count of smallest units (10^-18)
    pub fn from_smallest_units(count: u64) -> Self {
        Self(Decimal::from_i128_with_scale(i128::from(count), AMOUNT_SCALE))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Multiply by `numerator / denominator`, rounding toward zero at the
    /// smallest unit. Returns None on overflow or a zero denominator.
    pub fn mul_ratio_floor(&self, numerator: u32, denominator: u32) -> Option<Amount> {
        if denominator == 0 {
            return None;
        }
        let scaled = self
            .0
            .checked_mul(Decimal::from(numerator))?
            .checked_div(Decimal::from(denominator))?;
        Some(Amount(
            scaled.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero),
        ))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
