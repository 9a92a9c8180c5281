//! Amount type for handling monetary values as they appear in the sheet, e.g. `$1,200.00`.
//!
//! The sheet is read with formatted values, so balances arrive with currency symbols and
//! thousands separators. This module parses those strings back into `Decimal` values.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a money amount.
///
/// Formatting (whether a `$` is shown) is considered significant for equality, so for numeric
/// comparisons you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use cambio_desk::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,200.00").unwrap();
/// assert_eq!(amount.to_string(), "$1,200.00");
/// ```
///
/// Unparseable strings are coerced to zero:
/// ```
/// # use cambio_desk::model::Amount;
/// # use rust_decimal::Decimal;
/// assert_eq!(Amount::coerce("abc"), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// Whether the value is shown with a leading `$`.
    dollar: bool,
}

impl Amount {
    /// Creates a new `Amount` that displays with a dollar sign, e.g. `$1,200.00`.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            dollar: true,
        }
    }

    /// Creates a new `Amount` that displays without a dollar sign, e.g. `1,200.00`.
    pub const fn plain(value: Decimal) -> Self {
        Self {
            value,
            dollar: false,
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

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value().is_sign_negative() && !self.is_zero()
    }

    /// Parses a currency-formatted string into a `Decimal`, stripping `$` and `,`. Anything that
    /// cannot be parsed becomes zero.
    pub fn coerce(s: &str) -> Decimal {
        Amount::from_str(s)
            .map(|amount| amount.value())
            .unwrap_or_default()
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

        let dollar = trimmed.contains('$');
        let cleaned: String = trimmed.chars().filter(|c| !matches!(c, '$' | ',')).collect();
        let value = Decimal::from_str(cleaned.trim()).map_err(AmountError)?;
        Ok(Amount { value, dollar })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let dol = if self.dollar { "$" } else { "" };
        let num = self.value().abs().round_dp(2);
        write!(
            f,
            "{sign}{dol}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
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

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_coerce_currency_string() {
        assert_eq!(Amount::coerce("$1,200.00"), dec("1200.0"));
    }

    #[test]
    fn test_coerce_garbage_is_zero() {
        assert_eq!(Amount::coerce("abc"), Decimal::ZERO);
        assert_eq!(Amount::coerce("12abc"), Decimal::ZERO);
    }

    #[test]
    fn test_coerce_empty_is_zero() {
        assert_eq!(Amount::coerce(""), Decimal::ZERO);
        assert_eq!(Amount::coerce("   "), Decimal::ZERO);
    }

    #[test]
    fn test_coerce_negative() {
        assert_eq!(Amount::coerce("-$5,000.50"), dec("-5000.50"));
        assert_eq!(Amount::coerce("-250"), dec("-250"));
    }

    #[test]
    fn test_coerce_plain_number() {
        assert_eq!(Amount::coerce("18.55"), dec("18.55"));
        assert_eq!(Amount::coerce(" 42 "), dec("42"));
    }

    #[test]
    fn test_parse_remembers_dollar() {
        let a = Amount::from_str("$50.00").unwrap();
        let b = Amount::from_str("50.00").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.value(), b.value());
        assert_eq!(a.to_string(), "$50.00");
        assert_eq!(b.to_string(), "50.00");
    }

    #[test]
    fn test_display_negative() {
        let amount = Amount::new(dec("-60000"));
        assert_eq!(amount.to_string(), "-$60,000.00");
    }

    #[test]
    fn test_display_rounds_to_cents() {
        let amount = Amount::plain(dec("1234.5678"));
        assert_eq!(amount.to_string(), "1,234.57");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Amount::new(Decimal::ZERO).to_string(), "$0.00");
        assert!(!Amount::new(Decimal::ZERO).is_negative());
    }

    #[test]
    fn test_serde() {
        let amount = Amount::new(dec("50"));
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"$50.00\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(), dec("50"));
    }
}
