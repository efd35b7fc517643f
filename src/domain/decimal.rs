//! Lossless decimal money type backed by rust_decimal.
//!
//! Provides canonical parsing from strings, cent rounding, and formatting
//! without exponent notation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for prices, shipping costs and percentages.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to JSON number (not string) by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Build a money amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Decimal(RustDecimal::new(cents, 2))
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// Surrounding whitespace and a leading `$` are tolerated since upstream
    /// listings occasionally carry display-formatted prices.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
        RustDecimal::from_str(trimmed).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Format as a fixed two-decimal money string, e.g. `9.90`.
    pub fn to_money_string(&self) -> String {
        format!("{:.2}", self.round_to_cent().0)
    }

    /// Lossy conversion used where legacy floating-point parity is required.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Round half away from zero to two decimal places.
    pub fn round_to_cent(&self) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// `None` when the sum leaves the representable range.
    pub fn checked_add(&self, rhs: Decimal) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    pub fn checked_sub(&self, rhs: Decimal) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    /// Multiply by a whole quantity, `None` on overflow.
    pub fn checked_times(&self, qty: u32) -> Option<Self> {
        self.0.checked_mul(RustDecimal::from(qty)).map(Decimal)
    }

    /// Divide by a whole quantity. Division by zero yields the value itself.
    pub fn per(&self, qty: u32) -> Self {
        if qty == 0 {
            return *self;
        }
        Decimal(self.0 / RustDecimal::from(qty))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}
