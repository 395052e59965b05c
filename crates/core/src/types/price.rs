//! Product prices using decimal arithmetic.
//!
//! Amounts are Algerian dinars with two decimal places, matching the
//! `NUMERIC(10, 2)` columns they are stored in.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number: {0:?}")]
    NotANumber(String),
    /// The value is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The value does not fit in the storage column.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: u32,
    },
}

/// A non-negative price rounded to two decimal places.
///
/// ```
/// use robo_shop_core::Price;
///
/// let price = Price::parse("1250,5").unwrap();
/// assert_eq!(price.to_string(), "1250.50 DA");
/// assert_eq!(price.times(2).to_string(), "2501.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Exclusive upper bound imposed by `NUMERIC(10, 2)`.
    pub const MAX: u32 = 100_000_000;

    /// Zero dinars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` or `PriceError::TooLarge` when the
    /// amount is out of range.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Decimal::from(Self::MAX) {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }
        let mut amount = amount.round_dp(2);
        amount.rescale(2);
        Ok(Self(amount))
    }

    /// Parse a price from form input. Accepts `,` as the decimal separator.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the input is empty, not a number, or out
    /// of range.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let normalized = s.replace(',', ".");
        let amount =
            Decimal::from_str(&normalized).map_err(|_| PriceError::NotANumber(s.to_owned()))?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }

    /// The amount formatted with two decimals and no currency suffix,
    /// suitable for pre-filling a form field.
    #[must_use]
    pub fn form_value(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} DA", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // The column check constraint keeps stored prices in range
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rounds_to_cents() {
        let price = Price::parse("19.999").unwrap();
        assert_eq!(price.amount(), Decimal::new(2000, 2));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Price::parse("  "), Err(PriceError::Empty));
        assert!(matches!(Price::parse("abc"), Err(PriceError::NotANumber(_))));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert!(matches!(
            Price::parse("100000000"),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_times() {
        let price = Price::parse("2.50").unwrap();
        assert_eq!(price.times(3), Decimal::new(750, 2));
        assert_eq!(price.times(0), Decimal::ZERO);
    }

    #[test]
    fn test_display_and_form_value() {
        let price = Price::parse("7").unwrap();
        assert_eq!(price.to_string(), "7.00 DA");
        assert_eq!(price.form_value(), "7.00");
    }
}
