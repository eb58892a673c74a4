//! Trade records
//!
//! A trade is an immutable record of one match, created at match time and
//! never mutated or deleted afterwards. Settlement is atomic inside the
//! ledger, so there is no settlement state machine here.

use crate::ids::{AccountId, MarketId, OrderId, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable record of one match between a maker and a taker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Per-pair monotonic sequence number
    pub sequence: u64,
    pub symbol: MarketId,

    // Order references
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    // Account references
    pub maker_account_id: AccountId,
    pub taker_account_id: AccountId,

    /// Side of the taker (the incoming order that triggered the match)
    pub taker_side: Side,
    /// Execution price; always the maker's (resting) price
    pub price: Price,
    pub quantity: Quantity,

    /// Maker fee, denominated in the asset the maker received
    pub maker_fee: Decimal,
    /// Taker fee, denominated in the asset the taker received
    pub taker_fee: Decimal,

    pub executed_at: i64, // Unix nanos
}

impl Trade {
    /// Create a new trade record
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        symbol: MarketId,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_account_id: AccountId,
        taker_account_id: AccountId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        maker_fee: Decimal,
        taker_fee: Decimal,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            maker_account_id,
            taker_account_id,
            taker_side,
            price,
            quantity,
            maker_fee,
            taker_fee,
            executed_at,
        }
    }

    /// Trade value in the quote asset (price × quantity)
    pub fn trade_value(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }

    /// Check whether maker and taker are the same account (self-trade)
    pub fn is_self_trade(&self) -> bool {
        self.maker_account_id == self.taker_account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(maker: AccountId, taker: AccountId) -> Trade {
        Trade::new(
            123456,
            MarketId::new("BTC/USDT"),
            OrderId::new(),
            OrderId::new(),
            maker,
            taker,
            Side::BUY,
            Price::from_u64(50000),
            Quantity::from_str("0.5").unwrap(),
            Decimal::ZERO,
            Decimal::ZERO,
            1708123456789000000,
        )
    }

    #[test]
    fn test_trade_creation() {
        let trade = sample_trade(AccountId::new(), AccountId::new());

        assert_eq!(trade.sequence, 123456);
        assert_eq!(trade.taker_side, Side::BUY);
        assert!(!trade.is_self_trade());
    }

    #[test]
    fn test_trade_value() {
        let trade = sample_trade(AccountId::new(), AccountId::new());
        assert_eq!(trade.trade_value(), Decimal::from(25000));
    }

    #[test]
    fn test_self_trade_detection() {
        let account = AccountId::new();
        let trade = sample_trade(account, account);
        assert!(trade.is_self_trade());
    }

    #[test]
    fn test_trade_serialization() {
        let trade = sample_trade(AccountId::new(), AccountId::new());
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
