//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is a count of cents (2 fractional digits, exact).       │
//! │    Order totals are sums of integer products: no rounding drift.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Money crosses the API boundary as a decimal string with exactly two
//! fractional digits (`"20.00"`), and is stored as integer cents.
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! assert_eq!(doubled.to_string(), "21.98");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Same representation as the database columns
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **String serde**: `"10.99"`, so JSON clients never see floats
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Variant.price ──► OrderLine.unit_price ──► OrderLine.subtotal          │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │                                          Σ ──► Order.total_amount       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Error returned when a decimal string is not a valid amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid money amount '{input}': {reason}")]
pub struct ParseMoneyError {
    input: String,
    reason: &'static str,
}

impl ParseMoneyError {
    fn new(input: &str, reason: &'static str) -> Self {
        ParseMoneyError {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parses `"10"`, `"10.5"`, `"10.50"` and `"-3.25"`.
///
/// More than two fractional digits are rejected rather than rounded.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (major_str, minor_str) = match body.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (body, ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseMoneyError::new(s, "expected digits before the decimal point"));
        }
        if minor_str.len() > 2 || !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseMoneyError::new(s, "at most two fractional digits"));
        }

        let major: i64 = major_str
            .parse()
            .map_err(|_| ParseMoneyError::new(s, "amount out of range"))?;
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().unwrap_or(0) * 10,
            _ => minor_str.parse::<i64>().unwrap_or(0),
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| ParseMoneyError::new(s, "amount out of range"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as a plain decimal with two fractional digits: `"10.99"`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money::from_cents(cents)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display_has_two_fraction_digits() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(2000).to_string(), "20.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_parse() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("10.05".parse::<Money>().unwrap().cents(), 1005);
        assert_eq!("-3.25".parse::<Money>().unwrap().cents(), -325);
        assert_eq!(" 7.00 ".parse::<Money>().unwrap().cents(), 700);

        assert!("10.999".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
        assert!("1.2x".parse::<Money>().is_err());
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let json = serde_json::to_string(&Money::from_cents(2000)).unwrap();
        assert_eq!(json, "\"20.00\"");

        let back: Money = serde_json::from_str("\"12.34\"").unwrap();
        assert_eq!(back.cents(), 1234);
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_cents(1000);
        assert_eq!(price.checked_multiply_quantity(2), Some(Money::from_cents(2000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 5].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 355);
    }

    /// Summing many cent values stays exact where f64 would drift.
    #[test]
    fn test_no_rounding_drift() {
        let total: Money = std::iter::repeat(Money::from_cents(10)).take(1000).sum();
        assert_eq!(total.to_string(), "100.00");
    }
}
