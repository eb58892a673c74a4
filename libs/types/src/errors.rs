//! Error taxonomy for the exchange core
//!
//! Four user-visible classes: validation failures and insufficient funds
//! reject an order before any state change; not-found covers cancels that
//! lost the race or never existed; invariant violations are engine bugs,
//! fatal for the reporting operation and escalated to the operator.

use crate::ids::OrderId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error for all gateway and engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient funds for {asset}: required {required}, available {available}")]
    InsufficientFunds {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("order not found: {order_id}")]
    NotFound { order_id: OrderId },

    #[error("invariant violation: {detail}")]
    InvariantViolation { detail: String },
}

impl ExchangeError {
    /// Recoverable errors are returned to the caller and leave no trace;
    /// invariant violations require operator attention.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExchangeError::InvariantViolation { .. })
    }
}

/// Malformed or unservable order, refused before any state change
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("market closed: {0}")]
    MarketClosed(String),

    #[error("no opposite liquidity for market order on {0}")]
    NoLiquidity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidPrice("price not aligned to tick 0.5".to_string());
        assert_eq!(
            err.to_string(),
            "invalid price: price not aligned to tick 0.5"
        );
    }

    #[test]
    fn test_exchange_error_from_validation() {
        let err: ExchangeError = ValidationError::UnknownSymbol("XYZ/ABC".to_string()).into();
        assert!(matches!(err, ExchangeError::Validation(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_insufficient_funds_display() {
        let err = ExchangeError::InsufficientFunds {
            asset: "USDT".to_string(),
            required: Decimal::from(1500),
            available: Decimal::from(1000),
        };
        assert!(err.to_string().contains("USDT"));
        assert!(err.to_string().contains("1500"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invariant_violation_not_recoverable() {
        let err = ExchangeError::InvariantViolation {
            detail: "locked balance underflow".to_string(),
        };
        assert!(!err.is_recoverable());
    }
}
