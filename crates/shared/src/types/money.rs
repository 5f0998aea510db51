//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.
//!
//! Amounts are carried at full precision internally and rounded only when
//! they cross the presentation boundary (see [`round_for_display`]).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits shown to users and in API responses.
pub const DISPLAY_SCALE: u32 = 2;

/// Rounds an amount for presentation.
///
/// Uses half-away-from-zero, which is how invoice figures are rounded on
/// paper (`22.505` prints as `22.51`).
#[must_use]
pub fn round_for_display(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_SCALE);
    rounded
}

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. rupees), full precision.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian Rupee
    #[default]
    Inr,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Formats the amount the way it is printed on an invoice, e.g. `INR 295.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {}", self.currency, round_for_display(self.amount))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inr => write!(f, "INR"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case(dec!(22.5), "22.50")]
    #[case(dec!(22.505), "22.51")]
    #[case(dec!(22.504999), "22.50")]
    #[case(dec!(-0.005), "-0.01")]
    #[case(dec!(295), "295.00")]
    fn test_round_for_display(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(round_for_display(amount).to_string(), expected);
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(dec!(295), Currency::Inr);
        assert_eq!(money.display(), "INR 295.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("INR").unwrap(), Currency::Inr);
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::default(), Currency::Inr);
        assert!(Currency::from_str("XXX").is_err());
    }

    #[test]
    fn test_currency_serde() {
        assert_eq!(serde_json::to_string(&Currency::Inr).unwrap(), "\"INR\"");
        let parsed: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(parsed, Currency::Eur);
    }
}
