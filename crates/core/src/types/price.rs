//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pounds, not piastres).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub fn egp(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EGP)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}",
            self.currency_code.code(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EGP,
    USD,
    EUR,
}

impl CurrencyCode {
    /// The three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EGP => "EGP",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

/// Apply a percentage discount to a base price.
///
/// `percent` is expressed as a whole percentage (e.g. `20` for 20% off) and is
/// clamped to `0..=100`.
#[must_use]
pub fn apply_discount(base: Decimal, percent: Decimal) -> Decimal {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    base - (base * percent) / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::egp(Decimal::new(1200, 0)).to_string(), "EGP 1200.00");
        assert_eq!(Price::egp(Decimal::new(4995, 2)).to_string(), "EGP 49.95");
    }

    #[test]
    fn test_apply_discount() {
        assert_eq!(
            apply_discount(Decimal::new(500, 0), Decimal::new(20, 0)),
            Decimal::new(400, 0)
        );
        assert_eq!(
            apply_discount(Decimal::new(500, 0), Decimal::ZERO),
            Decimal::new(500, 0)
        );
    }

    #[test]
    fn test_apply_discount_is_clamped() {
        assert_eq!(
            apply_discount(Decimal::new(500, 0), Decimal::new(150, 0)),
            Decimal::ZERO
        );
        assert_eq!(
            apply_discount(Decimal::new(500, 0), Decimal::new(-10, 0)),
            Decimal::new(500, 0)
        );
    }
}
