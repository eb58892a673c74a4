//! Engine event definitions
//!
//! Every completed gateway operation emits an ordered stream of these
//! events for external consumers (persistence, market data). The stream
//! order within one operation is the order the state changes happened.

use serde::{Deserialize, Serialize};

use exchange_types::ids::{AccountId, MarketId, OrderId, TradeId};
use exchange_types::numeric::{Price, Quantity};
use exchange_types::order::{CancelReason, OrderKind, RejectReason, Side};
use exchange_types::trade::Trade;

/// Event emitted by the matching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ExchangeEvent {
    /// Order passed validation and reservation
    OrderAccepted {
        order_id: OrderId,
        account_id: AccountId,
        symbol: MarketId,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
        sequence: u64,
    },

    /// Order refused before any state change
    OrderRejected {
        order_id: OrderId,
        account_id: AccountId,
        symbol: MarketId,
        reason: RejectReason,
    },

    /// A trade was executed between maker and taker
    TradeExecuted {
        trade_id: TradeId,
        sequence: u64,
        symbol: MarketId,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_account_id: AccountId,
        taker_account_id: AccountId,
        /// Maker's price
        price: Price,
        quantity: Quantity,
        /// Side from the taker's perspective
        taker_side: Side,
        executed_at: i64,
    },

    /// An order was partially filled
    OrderPartiallyFilled {
        order_id: OrderId,
        filled_quantity: Quantity,
        remaining_quantity: Quantity,
    },

    /// An order was completely filled
    OrderFilled {
        order_id: OrderId,
        filled_quantity: Quantity,
    },

    /// An order left the book (or its remainder was discarded) unfilled
    OrderCancelled {
        order_id: OrderId,
        symbol: MarketId,
        side: Side,
        remaining_quantity: Quantity,
        reason: CancelReason,
    },
}

impl ExchangeEvent {
    /// Build a TradeExecuted event from a trade record
    pub fn from_trade(trade: &Trade) -> Self {
        ExchangeEvent::TradeExecuted {
            trade_id: trade.trade_id,
            sequence: trade.sequence,
            symbol: trade.symbol.clone(),
            maker_order_id: trade.maker_order_id,
            taker_order_id: trade.taker_order_id,
            maker_account_id: trade.maker_account_id,
            taker_account_id: trade.taker_account_id,
            price: trade.price,
            quantity: trade.quantity,
            taker_side: trade.taker_side,
            executed_at: trade.executed_at,
        }
    }

    /// Label used in structured logs
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeEvent::OrderAccepted { .. } => "OrderAccepted",
            ExchangeEvent::OrderRejected { .. } => "OrderRejected",
            ExchangeEvent::TradeExecuted { .. } => "TradeExecuted",
            ExchangeEvent::OrderPartiallyFilled { .. } => "OrderPartiallyFilled",
            ExchangeEvent::OrderFilled { .. } => "OrderFilled",
            ExchangeEvent::OrderCancelled { .. } => "OrderCancelled",
        }
    }
}
