//! Payment methods offered at checkout.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned for an unrecognised payment method code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown payment method: {0:?}")]
pub struct PaymentMethodError(pub String);

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// Algérie Poste's BaridiMob transfer.
    #[serde(rename = "BARIDI")]
    BaridiMob,
}

impl PaymentMethod {
    /// All methods, in the order shown on the checkout form.
    pub const ALL: [Self; 2] = [Self::CashOnDelivery, Self::BaridiMob];

    /// Stored code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "COD",
            Self::BaridiMob => "BARIDI",
        }
    }

    /// Label shown to the buyer.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "الدفع عند الاستلام",
            Self::BaridiMob => "BaridiMob",
        }
    }

    /// Parse an optional form field: blank means "not chosen".
    ///
    /// # Errors
    ///
    /// Returns `PaymentMethodError` for a non-blank, unknown code.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, PaymentMethodError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "COD" => Ok(Self::CashOnDelivery),
            "BARIDI" => Ok(Self::BaridiMob),
            other => Err(PaymentMethodError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::CashOnDelivery);
        assert_eq!("BARIDI".parse::<PaymentMethod>().unwrap(), PaymentMethod::BaridiMob);
        assert!("cod".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_parse_optional_blank() {
        assert_eq!(PaymentMethod::parse_optional("  ").unwrap(), None);
        assert_eq!(
            PaymentMethod::parse_optional("COD").unwrap(),
            Some(PaymentMethod::CashOnDelivery)
        );
        assert!(PaymentMethod::parse_optional("VISA").is_err());
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&PaymentMethod::BaridiMob).unwrap();
        assert_eq!(json, "\"BARIDI\"");
    }
}
