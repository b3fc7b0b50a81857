//! Amount type for handling monetary values with optional thousands separators.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that may
//! or may not include commas. Amounts are currency-agnostic.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Represents how amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ commas: true }` -> `1,500,000.00`
///  - `AmountFormat{ commas: false }` -> `1500000`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format has commas: e.g. `30,000.00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat { commas: true };

/// Represents a monetary amount.
///
/// Equality, ordering and hashing use the numeric value only, so `30000` equals `30,000.00`. The
/// format only affects `Display`. Stored amounts are written in their plain form and read back with
/// the default format.
///
/// # Examples
///
/// ```
/// # use moneymanager::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("30000").unwrap();
/// let b = Amount::from_str("30,000").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "30000");
/// assert_eq!(b.to_string(), "30,000.00");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value().is_sign_positive()
    }

    /// The shortest plain decimal form, without separators or trailing zeros, e.g. `30000` or
    /// `12.5`. This is what free-text searches match against.
    pub fn plain(&self) -> String {
        self.value.normalize().to_string()
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Amount {}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.normalize().hash(state);
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // Remove commas (thousand separators)
        let without_commas = trimmed.replace(',', "");
        let commas = without_commas.len() < trimmed.len();

        let value = Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map_err(AmountError)?;
        Ok(Amount {
            value,
            format: AmountFormat { commas },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.value().is_sign_negative() && !self.is_zero() {
            ("-", self.value().abs())
        } else {
            ("", self.value())
        };

        if self.format.commas {
            write!(
                f,
                "{sign}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.plain())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s)
            .map(|a| Amount::new(a.value()))
            .map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("30000").unwrap();
        assert_eq!(amount.value(), Decimal::from(30000));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("").unwrap();
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_whitespace() {
        let amount = Amount::from_str("  50.00  ").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("50.00").unwrap());
    }

    #[test]
    fn test_parse_scientific() {
        let amount = Amount::from_str("1.5e7").unwrap();
        assert_eq!(amount.value(), Decimal::from(15_000_000));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("thirty").is_err());
    }

    #[test]
    fn test_parse_retain_commas() {
        let s = "1,000,000.00";
        let amount = Amount::from_str(s).unwrap();
        assert_eq!(amount.value(), Decimal::from(1_000_000));
        assert_eq!(amount.to_string(), s);
    }

    #[test]
    fn test_display_without_commas() {
        let amount = Amount::from_str("1500000").unwrap();
        assert_eq!(amount.to_string(), "1500000");
    }

    #[test]
    fn test_plain() {
        let amount = Amount::new(Decimal::from_str("30000.00").unwrap());
        assert_eq!(amount.plain(), "30000");
        let amount = Amount::new(Decimal::from_str("12.50").unwrap());
        assert_eq!(amount.plain(), "12.5");
    }

    #[test]
    fn test_serde_is_lossless() {
        let amount = Amount::from_str("12,345,678,901,234,567.891").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"12345678901234567.891\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(), amount.value());
        let small: Amount = serde_json::from_str("\"1000000.5\"").unwrap();
        assert_eq!(small.to_string(), "1,000,000.50");
    }

    #[test]
    fn test_equality_ignores_format() {
        let a = Amount::from_str("30000").unwrap();
        let b = Amount::new(Decimal::from_str("30000.00").unwrap());
        assert_eq!(a, b);
        let set: std::collections::HashSet<Amount> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_zero_is_not_positive() {
        let zero = Amount::from_str("0").unwrap();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(Amount::from_str("1").unwrap().is_positive());
        assert!(!Amount::from_str("-1").unwrap().is_positive());
    }

    #[test]
    fn test_ordering() {
        let a1 = Amount::from_str("30").unwrap();
        let a2 = Amount::from_str("50").unwrap();
        assert!(a1 < a2);
    }
}
