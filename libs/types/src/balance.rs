//! Per-asset balance with available/locked split
//!
//! Invariant: total = available + locked, all three non-negative.
//! Reservation moves available into locked; settlement consumes locked.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Balance mutation failures
///
/// `InsufficientAvailable` is a user-level condition (reservation or
/// withdrawal refused). `InsufficientLocked` means the engine asked to
/// consume funds it never reserved, which is a consistency breach.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    #[error("insufficient available balance for {asset}: required {required}, available {available}")]
    InsufficientAvailable {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient locked balance for {asset}: required {required}, locked {locked}")]
    InsufficientLocked {
        asset: String,
        required: Decimal,
        locked: Decimal,
    },

    #[error("negative amount for {asset}: {amount}")]
    NegativeAmount { asset: String, amount: Decimal },
}

/// Balance for a single asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub total: Decimal,
    pub available: Decimal,
    pub locked: Decimal,
}

impl Balance {
    /// Create a new balance, fully available
    pub fn new(asset: impl Into<String>, total: Decimal) -> Self {
        Self {
            asset: asset.into(),
            total,
            available: total,
            locked: Decimal::ZERO,
        }
    }

    /// Create an empty balance
    pub fn empty(asset: impl Into<String>) -> Self {
        Self::new(asset, Decimal::ZERO)
    }

    /// Check balance invariant: total = available + locked
    pub fn check_invariant(&self) -> bool {
        self.total == self.available + self.locked
            && self.available >= Decimal::ZERO
            && self.locked >= Decimal::ZERO
    }

    fn guard_amount(&self, amount: Decimal) -> Result<(), BalanceError> {
        if amount < Decimal::ZERO {
            return Err(BalanceError::NegativeAmount {
                asset: self.asset.clone(),
                amount,
            });
        }
        Ok(())
    }

    /// Move `amount` from available into locked
    pub fn lock(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.guard_amount(amount)?;
        if amount > self.available {
            return Err(BalanceError::InsufficientAvailable {
                asset: self.asset.clone(),
                required: amount,
                available: self.available,
            });
        }

        self.available -= amount;
        self.locked += amount;

        debug_assert!(self.check_invariant());
        Ok(())
    }

    /// Move `amount` from locked back into available
    pub fn unlock(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.guard_amount(amount)?;
        if amount > self.locked {
            return Err(BalanceError::InsufficientLocked {
                asset: self.asset.clone(),
                required: amount,
                locked: self.locked,
            });
        }

        self.locked -= amount;
        self.available += amount;

        debug_assert!(self.check_invariant());
        Ok(())
    }

    /// Consume `amount` out of locked (the debit half of a settlement)
    pub fn deduct_locked(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.guard_amount(amount)?;
        if amount > self.locked {
            return Err(BalanceError::InsufficientLocked {
                asset: self.asset.clone(),
                required: amount,
                locked: self.locked,
            });
        }

        self.locked -= amount;
        self.total -= amount;

        debug_assert!(self.check_invariant());
        Ok(())
    }

    /// Credit `amount` to available (deposit or settlement credit)
    pub fn credit(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.guard_amount(amount)?;

        self.available += amount;
        self.total += amount;

        debug_assert!(self.check_invariant());
        Ok(())
    }

    /// Debit `amount` from available (withdrawal)
    pub fn debit_available(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.guard_amount(amount)?;
        if amount > self.available {
            return Err(BalanceError::InsufficientAvailable {
                asset: self.asset.clone(),
                required: amount,
                available: self.available,
            });
        }

        self.available -= amount;
        self.total -= amount;

        debug_assert!(self.check_invariant());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_creation() {
        let balance = Balance::new("USDT", Decimal::from(10000));
        assert_eq!(balance.total, Decimal::from(10000));
        assert_eq!(balance.available, Decimal::from(10000));
        assert_eq!(balance.locked, Decimal::ZERO);
        assert!(balance.check_invariant());
    }

    #[test]
    fn test_balance_lock() {
        let mut balance = Balance::new("USDT", Decimal::from(10000));
        balance.lock(Decimal::from(3000)).unwrap();

        assert_eq!(balance.total, Decimal::from(10000));
        assert_eq!(balance.available, Decimal::from(7000));
        assert_eq!(balance.locked, Decimal::from(3000));
        assert!(balance.check_invariant());
    }

    #[test]
    fn test_balance_overlock_refused() {
        let mut balance = Balance::new("USDT", Decimal::from(100));
        let err = balance.lock(Decimal::from(150)).unwrap_err();
        assert!(matches!(err, BalanceError::InsufficientAvailable { .. }));
        // No side effects on failure
        assert_eq!(balance.available, Decimal::from(100));
        assert_eq!(balance.locked, Decimal::ZERO);
    }

    #[test]
    fn test_balance_unlock() {
        let mut balance = Balance::new("USDT", Decimal::from(10000));
        balance.lock(Decimal::from(3000)).unwrap();
        balance.unlock(Decimal::from(1000)).unwrap();

        assert_eq!(balance.available, Decimal::from(8000));
        assert_eq!(balance.locked, Decimal::from(2000));
        assert!(balance.check_invariant());
    }

    #[test]
    fn test_balance_over_unlock_is_error() {
        let mut balance = Balance::new("USDT", Decimal::from(100));
        balance.lock(Decimal::from(50)).unwrap();
        let err = balance.unlock(Decimal::from(60)).unwrap_err();
        assert!(matches!(err, BalanceError::InsufficientLocked { .. }));
    }

    #[test]
    fn test_balance_deduct_locked() {
        let mut balance = Balance::new("USDT", Decimal::from(10000));
        balance.lock(Decimal::from(3000)).unwrap();
        balance.deduct_locked(Decimal::from(1000)).unwrap();

        assert_eq!(balance.total, Decimal::from(9000));
        assert_eq!(balance.locked, Decimal::from(2000));
        assert!(balance.check_invariant());
    }

    #[test]
    fn test_balance_credit() {
        let mut balance = Balance::new("USDT", Decimal::from(10000));
        balance.credit(Decimal::from(5000)).unwrap();

        assert_eq!(balance.total, Decimal::from(15000));
        assert_eq!(balance.available, Decimal::from(15000));
        assert!(balance.check_invariant());
    }

    #[test]
    fn test_balance_debit_available() {
        let mut balance = Balance::new("BTC", Decimal::from(5));
        balance.debit_available(Decimal::from(2)).unwrap();
        assert_eq!(balance.total, Decimal::from(3));

        let err = balance.debit_available(Decimal::from(10)).unwrap_err();
        assert!(matches!(err, BalanceError::InsufficientAvailable { .. }));
    }

    #[test]
    fn test_negative_amount_refused() {
        let mut balance = Balance::new("BTC", Decimal::from(5));
        let err = balance.lock(Decimal::from(-1)).unwrap_err();
        assert!(matches!(err, BalanceError::NegativeAmount { .. }));
    }
}
