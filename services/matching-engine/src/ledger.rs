//! Balance ledger
//!
//! Holds per-account, per-asset balances with an available/locked split.
//! Reservation (lock) guarantees a resting order can settle; settlement
//! consumes locked funds on both sides atomically. All mutation is
//! serialized behind the caller's lock, so the four-way settlement either
//! fully applies or not at all: both debits are verified before the first
//! mutation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::error;

use exchange_types::balance::{Balance, BalanceError};
use exchange_types::errors::ExchangeError;
use exchange_types::ids::AccountId;

/// Per-account, per-asset balance store
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<AccountId, HashMap<String, Balance>>,
    /// Fees retained by the exchange, per asset
    fees_collected: HashMap<String, Decimal>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    fn balance_mut(&mut self, account: AccountId, asset: &str) -> &mut Balance {
        self.accounts
            .entry(account)
            .or_default()
            .entry(asset.to_string())
            .or_insert_with(|| Balance::empty(asset))
    }

    /// Read a balance; None when the account never held the asset
    pub fn balance(&self, account: AccountId, asset: &str) -> Option<&Balance> {
        self.accounts.get(&account)?.get(asset)
    }

    /// Available funds, zero when the row is absent
    pub fn available(&self, account: AccountId, asset: &str) -> Decimal {
        self.balance(account, asset)
            .map(|b| b.available)
            .unwrap_or(Decimal::ZERO)
    }

    /// Locked funds, zero when the row is absent
    pub fn locked(&self, account: AccountId, asset: &str) -> Decimal {
        self.balance(account, asset)
            .map(|b| b.locked)
            .unwrap_or(Decimal::ZERO)
    }

    /// Total holding (available + locked), zero when the row is absent
    pub fn total(&self, account: AccountId, asset: &str) -> Decimal {
        self.balance(account, asset)
            .map(|b| b.total)
            .unwrap_or(Decimal::ZERO)
    }

    /// Fees retained so far in the given asset
    pub fn fees_collected(&self, asset: &str) -> Decimal {
        self.fees_collected
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// External deposit: credit available funds
    pub fn deposit(&mut self, account: AccountId, asset: &str, amount: Decimal) -> Result<(), ExchangeError> {
        self.balance_mut(account, asset)
            .credit(amount)
            .map_err(Self::map_balance_error)
    }

    /// External withdrawal: debit available funds
    pub fn withdraw(&mut self, account: AccountId, asset: &str, amount: Decimal) -> Result<(), ExchangeError> {
        self.balance_mut(account, asset)
            .debit_available(amount)
            .map_err(Self::map_balance_error)
    }

    /// Reserve funds for an order: move available into locked
    ///
    /// Fails with `InsufficientFunds` and no side effects when available
    /// funds do not cover the amount.
    pub fn reserve(&mut self, account: AccountId, asset: &str, amount: Decimal) -> Result<(), ExchangeError> {
        self.balance_mut(account, asset)
            .lock(amount)
            .map_err(Self::map_balance_error)
    }

    /// Release a reservation: move locked back into available
    ///
    /// A shortfall here means the engine releases funds it never
    /// reserved; that is an invariant violation, not a user error.
    pub fn release(&mut self, account: AccountId, asset: &str, amount: Decimal) -> Result<(), ExchangeError> {
        self.balance_mut(account, asset)
            .unlock(amount)
            .map_err(Self::map_balance_error)
    }

    /// Settle one trade between buyer and seller
    ///
    /// Moves `quantity` of base from the seller's locked funds to the
    /// buyer, and `quantity × price` of quote from the buyer's locked
    /// funds to the seller. Fees are withheld from each credit and
    /// retained by the exchange. All four mutations apply or none do:
    /// both debits are verified before the first write.
    #[allow(clippy::too_many_arguments)]
    pub fn settle(
        &mut self,
        buyer: AccountId,
        seller: AccountId,
        base_asset: &str,
        quote_asset: &str,
        quantity: Decimal,
        price: Decimal,
        buyer_fee: Decimal,
        seller_fee: Decimal,
    ) -> Result<(), ExchangeError> {
        let cost = quantity * price;

        // Verification phase: nothing is mutated until both debits and
        // both fee-adjusted credits are known to be valid.
        let seller_locked_base = self.locked(seller, base_asset);
        if seller_locked_base < quantity {
            return Err(self.settlement_fault(format!(
                "seller {seller} locked {base_asset} {seller_locked_base} < fill quantity {quantity}"
            )));
        }
        let buyer_locked_quote = self.locked(buyer, quote_asset);
        if buyer_locked_quote < cost {
            return Err(self.settlement_fault(format!(
                "buyer {buyer} locked {quote_asset} {buyer_locked_quote} < fill cost {cost}"
            )));
        }
        if buyer_fee < Decimal::ZERO || buyer_fee > quantity || seller_fee < Decimal::ZERO || seller_fee > cost {
            return Err(self.settlement_fault(format!(
                "fees out of range: buyer_fee {buyer_fee} of {quantity}, seller_fee {seller_fee} of {cost}"
            )));
        }

        // Mutation phase: prechecked, so each step is infallible; any
        // failure now is itself an invariant breach.
        self.balance_mut(seller, base_asset)
            .deduct_locked(quantity)
            .map_err(Self::map_balance_error)?;
        self.balance_mut(buyer, base_asset)
            .credit(quantity - buyer_fee)
            .map_err(Self::map_balance_error)?;
        self.balance_mut(buyer, quote_asset)
            .deduct_locked(cost)
            .map_err(Self::map_balance_error)?;
        self.balance_mut(seller, quote_asset)
            .credit(cost - seller_fee)
            .map_err(Self::map_balance_error)?;

        if !buyer_fee.is_zero() {
            *self
                .fees_collected
                .entry(base_asset.to_string())
                .or_insert(Decimal::ZERO) += buyer_fee;
        }
        if !seller_fee.is_zero() {
            *self
                .fees_collected
                .entry(quote_asset.to_string())
                .or_insert(Decimal::ZERO) += seller_fee;
        }

        Ok(())
    }

    fn settlement_fault(&self, detail: String) -> ExchangeError {
        error!(detail = %detail, "settlement precondition failed");
        ExchangeError::InvariantViolation { detail }
    }

    fn map_balance_error(err: BalanceError) -> ExchangeError {
        match err {
            BalanceError::InsufficientAvailable {
                asset,
                required,
                available,
            } => ExchangeError::InsufficientFunds {
                asset,
                required,
                available,
            },
            BalanceError::InsufficientLocked { .. } | BalanceError::NegativeAmount { .. } => {
                let detail = err.to_string();
                error!(detail = %detail, "ledger invariant violation");
                ExchangeError::InvariantViolation { detail }
            }
        }
    }
}
