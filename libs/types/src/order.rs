//! Order lifecycle types
//!
//! An order is immutable intent once accepted; only `remaining_quantity`,
//! `filled_quantity`, `status`, and the update stamp change afterwards,
//! and only inside the matching engine.

use crate::ids::{AccountId, MarketId, OrderId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order kind: limit (priced) or market (unpriced)
///
/// Kind-specific crossing and reservation behavior lives in the matching
/// engine; the shared remaining/status core lives on [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "price")]
pub enum OrderKind {
    /// Rest at the given price unless immediately crossed
    #[serde(rename = "LIMIT")]
    Limit(Price),
    /// Take whatever opposite liquidity exists; never rests
    #[serde(rename = "MARKET")]
    Market,
}

impl OrderKind {
    /// The limit price, if this is a limit order
    pub fn limit_price(&self) -> Option<Price> {
        match self {
            OrderKind::Limit(price) => Some(*price),
            OrderKind::Market => None,
        }
    }

    /// Check whether this is a market order
    pub fn is_market(&self) -> bool {
        matches!(self, OrderKind::Market)
    }
}

/// Order status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum OrderStatus {
    /// Accepted, no fills yet
    #[serde(rename = "OPEN")]
    Open,

    /// Partially matched
    #[serde(rename = "PARTIALLY_FILLED")]
    PartiallyFilled,

    /// Completely matched (terminal)
    #[serde(rename = "FILLED")]
    Filled,

    /// Removed before completion (terminal)
    #[serde(rename = "CANCELLED")]
    Cancelled(CancelReason),

    /// Refused before any state change (terminal)
    #[serde(rename = "REJECTED")]
    Rejected(RejectReason),
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled(_) | OrderStatus::Rejected(_)
        )
    }
}

/// Why an order left the book before filling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    UserRequested,
    /// Self-trade prevention cancelled the incoming remainder
    SelfTrade,
    /// Market order remainder after opposite liquidity ran out
    UnfilledMarketRemainder,
    /// Settlement fault halted matching for this order
    SettlementFault,
    /// Pair removed by an administrative operation
    AdminCancel,
}

/// Why an order was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    InvalidPrice,
    InvalidQuantity,
    InsufficientBalance,
    UnknownSymbol,
    MarketClosed,
    /// Market order against an empty opposite book
    NoLiquidity,
}

/// Complete order structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub symbol: MarketId,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    /// Monotonic arrival sequence number, assigned at acceptance.
    /// This is the time-priority tie-break, not wall clock.
    pub sequence: u64,
    pub created_at: i64, // Unix nanos
    pub updated_at: i64, // Unix nanos
}

impl Order {
    /// Create a new open order
    pub fn new(
        account_id: AccountId,
        symbol: MarketId,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
        sequence: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            account_id,
            symbol,
            side,
            kind,
            quantity,
            filled_quantity: Quantity::zero(),
            remaining_quantity: quantity,
            status: OrderStatus::Open,
            sequence,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Check quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity.as_decimal() + self.remaining_quantity.as_decimal()
            == self.quantity.as_decimal()
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Update filled quantity and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed total quantity or violate invariants
    pub fn add_fill(&mut self, fill_quantity: Quantity, timestamp: i64) {
        let new_filled = self.filled_quantity + fill_quantity;

        assert!(
            new_filled.as_decimal() <= self.quantity.as_decimal(),
            "Fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        self.remaining_quantity = self.quantity.saturating_sub(new_filled);

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::PartiallyFilled;
        }

        self.updated_at = timestamp;

        assert!(self.check_invariant(), "Invariant violated after fill");
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if order is already in terminal state
    pub fn cancel(&mut self, reason: CancelReason, timestamp: i64) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");

        self.status = OrderStatus::Cancelled(reason);
        self.updated_at = timestamp;
    }

    /// Reject the order
    ///
    /// # Panics
    /// Panics if the order already has fills; rejection happens before
    /// any state change
    pub fn reject(&mut self, reason: RejectReason, timestamp: i64) {
        assert!(!self.has_fills(), "Cannot reject order with fills");

        self.status = OrderStatus::Rejected(reason);
        self.updated_at = timestamp;
    }
}
