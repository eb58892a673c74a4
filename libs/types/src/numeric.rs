//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Sign constraints are enforced at construction: a Price is strictly
//! positive, a Quantity is non-negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use thiserror::Error;

/// Construction errors for numeric newtypes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("failed to parse decimal: {0}")]
    Parse(String),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("quantity must be non-negative, got {0}")]
    NegativeQuantity(Decimal),
}

/// A strictly positive execution or limit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Try to create a price; None unless the value is strictly positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from a whole number of quote units
    ///
    /// `value` must be non-zero; zero prices are rejected at the
    /// validation boundary before any Price is constructed.
    pub fn from_u64(value: u64) -> Self {
        debug_assert!(value > 0, "Price::from_u64 requires a non-zero value");
        Self(Decimal::from(value))
    }

    /// Parse from a decimal string
    pub fn from_str(s: &str) -> Result<Self, NumericError> {
        let value: Decimal = s
            .parse()
            .map_err(|e: rust_decimal::Error| NumericError::Parse(e.to_string()))?;
        Self::try_new(value).ok_or(NumericError::NonPositivePrice(value))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative order or trade quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// The zero quantity
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Try to create a quantity; None if the value is negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from a whole number of base units
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse from a decimal string
    pub fn from_str(s: &str) -> Result<Self, NumericError> {
        let value: Decimal = s
            .parse()
            .map_err(|e: rust_decimal::Error| NumericError::Parse(e.to_string()))?;
        Self::try_new(value).ok_or(NumericError::NegativeQuantity(value))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check for zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Quantity decremented by `other`, saturating at zero
    pub fn saturating_sub(&self, other: Quantity) -> Quantity {
        Quantity::try_new(self.0 - other.0).unwrap_or_else(Quantity::zero)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, other: Quantity) -> Quantity {
        Quantity(self.0 + other.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_non_positive() {
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::from(-5)).is_none());
        assert!(Price::try_new(Decimal::ONE).is_some());
    }

    #[test]
    fn test_price_from_str() {
        let price = Price::from_str("50000.25").unwrap();
        assert_eq!(price.as_decimal().to_string(), "50000.25");

        assert!(matches!(
            Price::from_str("-1"),
            Err(NumericError::NonPositivePrice(_))
        ));
        assert!(matches!(Price::from_str("abc"), Err(NumericError::Parse(_))));
    }

    #[test]
    fn test_price_ordering() {
        let low = Price::from_u64(49000);
        let high = Price::from_u64(50000);
        assert!(low < high);
    }

    #[test]
    fn test_quantity_rejects_negative() {
        assert!(Quantity::try_new(Decimal::from(-1)).is_none());
        assert!(Quantity::try_new(Decimal::ZERO).is_some());
    }

    #[test]
    fn test_quantity_zero() {
        assert!(Quantity::zero().is_zero());
        assert!(!Quantity::from_u64(1).is_zero());
    }

    #[test]
    fn test_quantity_add() {
        let total = Quantity::from_str("1.5").unwrap() + Quantity::from_str("2.5").unwrap();
        assert_eq!(total, Quantity::from_str("4.0").unwrap());
    }

    #[test]
    fn test_quantity_saturating_sub() {
        let a = Quantity::from_str("3.0").unwrap();
        let b = Quantity::from_str("1.0").unwrap();
        assert_eq!(a.saturating_sub(b), Quantity::from_str("2.0").unwrap());
        assert_eq!(b.saturating_sub(a), Quantity::zero());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn quantity_saturating_sub_never_negative(a in 0u64..1_000_000, b in 0u64..1_000_000) {
                let result = Quantity::from_u64(a).saturating_sub(Quantity::from_u64(b));
                prop_assert!(result.as_decimal() >= Decimal::ZERO);
                prop_assert_eq!(result, Quantity::from_u64(a.saturating_sub(b)));
            }

            #[test]
            fn price_ordering_matches_decimal(a in 1u64..1_000_000, b in 1u64..1_000_000) {
                let lhs = Price::from_u64(a);
                let rhs = Price::from_u64(b);
                prop_assert_eq!(lhs.cmp(&rhs), a.cmp(&b));
            }
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        let price = Price::from_str("3000.50").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, back);

        let qty = Quantity::from_str("0.001").unwrap();
        let json = serde_json::to_string(&qty).unwrap();
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(qty, back);
    }
}
