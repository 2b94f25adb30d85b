//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A booking of 100.00 paid as 33.33 + 33.33 + 33.34 must sum to         │
//! │  EXACTLY 100.00, or the "never exceeds price" check drifts.            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    3333 + 3333 + 3334 = 10000 cents, always                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Parsing
//! Amounts arrive from the UI as JSON numbers or decimal strings. They are
//! parsed from their *textual* form, never through f64 arithmetic, and rounded
//! half away from zero to whole cents. The rounding error of any single
//! amount is therefore at most one cent.
//!
//! ```rust
//! use bloom_core::money::Money;
//!
//! let price: Money = "100".parse().unwrap();
//! assert_eq!(price.cents(), 10000);
//!
//! let rounded: Money = "19.995".parse().unwrap();
//! assert_eq!(rounded.cents(), 2000);
//!
//! assert_eq!(Money::from_cents(4050).to_string(), "40.50");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: a remaining balance may go negative as a transient
///   validation signal
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde as decimal string**: `"40.00"` on the wire, lossless both ways
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Booking.price ──────────────┐                                          │
/// │                              ▼                                          │
/// │  Payment.amount ──► sum_by_method ──► remaining_balance ──► UI          │
/// │                              │                                          │
/// │  PaymentEvent.amount ──► refundable_balance ──► refund check           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use bloom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion, truncated toward zero.
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

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds two amounts, returning `None` on overflow.
    ///
    /// Used where the operands come straight from user input.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Parses a decimal amount such as `"40"`, `"40.5"` or `"-3.25"`.
    ///
    /// ## Rules
    /// - Optional leading sign, digits, optional `.` and fraction digits
    /// - No exponent, no thousands separators, no currency symbol
    /// - More than two fraction digits round half away from zero
    ///
    /// ```rust
    /// use bloom_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("0.1").unwrap().cents(), 10);
    /// assert_eq!(Money::parse_decimal("0.005").unwrap().cents(), 1);
    /// assert!(Money::parse_decimal("1e3").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let text = input.trim();
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("must be a decimal number"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }

        let overflow = || invalid("is too large");

        let mut cents: i64 = 0;
        for digit in whole.bytes() {
            cents = cents
                .checked_mul(10)
                .and_then(|c| c.checked_add(i64::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }
        cents = cents.checked_mul(100).ok_or_else(overflow)?;

        let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|d| d >= 5);

        cents = cents
            .checked_add(tenths * 10 + hundredths + i64::from(round_up))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal with two fraction digits, no currency symbol.
///
/// This is also the wire format, so it must stay parseable by
/// [`Money::parse_decimal`].
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_decimal(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts JSON numbers (`40`, `40.5`) and decimal strings (`"40.50"`).
///
/// Floats are converted through their shortest round-trip text form, so
/// `0.1` becomes exactly 10 cents.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount as number or string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| E::custom("amount is too large"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Money)
                    .ok_or_else(|| E::custom("amount is too large"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                if !v.is_finite() {
                    return Err(E::custom("amount must be finite"));
                }
                Money::parse_decimal(&v.to_string()).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                Money::parse_decimal(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
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
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("40").unwrap().cents(), 4000);
        assert_eq!(Money::parse_decimal("40.5").unwrap().cents(), 4050);
        assert_eq!(Money::parse_decimal("40.05").unwrap().cents(), 4005);
        assert_eq!(Money::parse_decimal(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse_decimal("12.").unwrap().cents(), 1200);
        assert_eq!(Money::parse_decimal(" 7.10 ").unwrap().cents(), 710);
        assert_eq!(Money::parse_decimal("-3.25").unwrap().cents(), -325);
        assert_eq!(Money::parse_decimal("+3").unwrap().cents(), 300);
    }

    #[test]
    fn test_parse_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::parse_decimal("0.004").unwrap().cents(), 0);
        assert_eq!(Money::parse_decimal("0.005").unwrap().cents(), 1);
        assert_eq!(Money::parse_decimal("19.999").unwrap().cents(), 2000);
        assert_eq!(Money::parse_decimal("-0.125").unwrap().cents(), -13);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        for bad in ["", ".", "-", "abc", "1e3", "1,000", "$5", "1.2.3", "NaN"] {
            assert!(Money::parse_decimal(bad).is_err(), "{bad:?} should fail");
        }
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b - a).cents(), -500);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_sum_thirds_is_exact() {
        let parts = [3333, 3333, 3334].map(Money::from_cents);
        let total: Money = parts.iter().sum();
        assert_eq!(total, Money::from_cents(10000));
    }

    #[test]
    fn test_zero_and_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }

    #[test]
    fn test_serde_wire_format() {
        let json = serde_json::to_string(&Money::from_cents(4000)).unwrap();
        assert_eq!(json, "\"40.00\"");

        let from_number: Money = serde_json::from_str("40.5").unwrap();
        assert_eq!(from_number.cents(), 4050);

        let from_int: Money = serde_json::from_str("30").unwrap();
        assert_eq!(from_int.cents(), 3000);

        let from_string: Money = serde_json::from_str("\"0.10\"").unwrap();
        assert_eq!(from_string.cents(), 10);

        let float_sum: Money = serde_json::from_str("0.30000000000000004").unwrap();
        assert_eq!(float_sum.cents(), 30);

        assert!(serde_json::from_str::<Money>("true").is_err());
    }
}
