use crate::error::ShopError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary value as reported by the backend.
///
/// Wraps `rust_decimal::Decimal` so that line totals, sales figures and
/// settlement sums never go through floating point. The backend sends amounts
/// either as JSON numbers or as strings such as `"120.50"`; both deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

fn too_large() -> ShopError {
    ShopError::validation("Amount is too large.")
}

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Adds two amounts, failing instead of overflowing.
    pub fn checked_add(self, rhs: Self) -> Result<Self, ShopError> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(too_large)
    }

    pub fn checked_mul(self, factor: Decimal) -> Result<Self, ShopError> {
        self.0.checked_mul(factor).map(Self).ok_or_else(too_large)
    }

    pub fn checked_sum<I>(amounts: I) -> Result<Self, ShopError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// A strictly positive amount, the only kind that may be sent as a settlement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ShopError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ShopError::validation("Amount must be positive"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Money> for Amount {
    type Error = ShopError;

    fn try_from(value: Money) -> Result<Self, Self::Error> {
        Self::new(value.0)
    }
}

impl From<Amount> for Money {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_sum() {
        let total =
            Money::checked_sum([dec!(50.0), dec!(30.25), dec!(0.75)].map(Money::new)).unwrap();
        assert_eq!(total, Money::new(dec!(81.0)));
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        let max = Money::new(Decimal::MAX);
        assert!(max.checked_add(Money::new(dec!(1))).unwrap_err().is_validation());
        assert!(max.checked_mul(dec!(2)).unwrap_err().is_validation());
        assert!(Money::checked_sum([max, max]).is_err());
        assert_eq!(
            Money::new(dec!(2.5)).checked_mul(dec!(3)).unwrap(),
            Money::new(dec!(7.5))
        );
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(ShopError::ValidationError(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-5)),
            Err(ShopError::ValidationError(_))
        ));
    }

    #[test]
    fn test_money_deserializes_from_string_and_number() {
        let a: Money = serde_json::from_str("\"120.50\"").unwrap();
        let b: Money = serde_json::from_str("120.5").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "120.5");
    }
}
