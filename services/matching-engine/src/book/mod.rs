//! Order book infrastructure module
//!
//! Contains price levels, bid book, ask book, and the combined per-pair
//! order book with cancel-by-id support.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::{BookEntry, PriceLevel};

use std::collections::HashMap;

use exchange_types::ids::{MarketId, OrderId};
use exchange_types::numeric::{Price, Quantity};
use exchange_types::order::{Order, Side};
use serde::{Deserialize, Serialize};

/// Order book for a single trading pair
///
/// Two price-ordered sides plus an id index so cancels do not need to
/// know the order's side or price. Invariants: an order appears in at
/// most one side, at most once; every indexed order has remaining > 0;
/// emptied levels are pruned immediately.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: MarketId,
    bids: BidBook,
    asks: AskBook,
    /// Resting order locations for cancel-by-id
    index: HashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    /// Create an empty book for the given pair
    pub fn new(symbol: MarketId) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: HashMap::new(),
        }
    }

    /// The pair this book belongs to
    pub fn symbol(&self) -> &MarketId {
        &self.symbol
    }

    /// Insert a resting limit order at the back of its level's queue
    ///
    /// Returns false for market orders (which never rest) and for ids
    /// already present in the book.
    pub fn insert(&mut self, order: &Order) -> bool {
        let Some(price) = order.kind.limit_price() else {
            return false;
        };
        if order.remaining_quantity.is_zero() || self.index.contains_key(&order.order_id) {
            return false;
        }

        let entry = BookEntry {
            order_id: order.order_id,
            account_id: order.account_id,
            sequence: order.sequence,
            remaining: order.remaining_quantity,
        };
        match order.side {
            Side::BUY => self.bids.insert(price, entry),
            Side::SELL => self.asks.insert(price, entry),
        }
        self.index.insert(order.order_id, (order.side, price));
        true
    }

    /// Remove a resting order by id
    ///
    /// Returns None when the order is not in the book (already retired),
    /// which callers report as not-found.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<(Side, Price, BookEntry)> {
        let (side, price) = self.index.remove(order_id)?;
        let entry = match side {
            Side::BUY => self.bids.remove(order_id, price),
            Side::SELL => self.asks.remove(order_id, price),
        };
        // Index and book move together; a miss here is unreachable
        entry.map(|e| (side, price, e))
    }

    /// Best bid (highest buy price) and aggregate quantity
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best_bid()
    }

    /// Best ask (lowest sell price) and aggregate quantity
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best_ask()
    }

    /// Peek the oldest order at the best opposite level for a taker
    ///
    /// A BUY taker takes from the asks, a SELL taker from the bids.
    pub fn best_maker(&self, taker_side: Side) -> Option<(Price, BookEntry)> {
        match taker_side {
            Side::BUY => self.asks.peek_front_best(),
            Side::SELL => self.bids.peek_front_best(),
        }
    }

    /// Reduce the current best maker by `fill`
    ///
    /// Retires the maker (and prunes its level) when remaining hits zero;
    /// the id index is kept in sync.
    pub fn fill_best_maker(&mut self, taker_side: Side, fill: Quantity) -> Option<(Price, BookEntry)> {
        let filled = match taker_side {
            Side::BUY => self.asks.fill_front_best(fill),
            Side::SELL => self.bids.fill_front_best(fill),
        };
        if let Some((_, entry)) = &filled {
            if entry.remaining.is_zero() {
                self.index.remove(&entry.order_id);
            }
        }
        filled
    }

    /// Ordered view of one price level, oldest order first
    pub fn queue_at(&self, side: Side, price: Price) -> Vec<BookEntry> {
        match side {
            Side::BUY => self.bids.queue_at(price),
            Side::SELL => self.asks.queue_at(price),
        }
    }

    /// All levels on one side, best price first
    pub fn levels_best_first(&self, side: Side) -> Vec<(Price, Quantity)> {
        match side {
            Side::BUY => self.bids.levels_best_first().collect(),
            Side::SELL => self.asks.levels_best_first().collect(),
        }
    }

    /// Check whether an order is resting in this book
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Number of resting orders across both sides
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Top-N depth snapshot of both sides
    pub fn depth_snapshot(&self, depth: usize) -> OrderBookSnapshot {
        OrderBookSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
        }
    }
}

/// Order book snapshot for market data consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: MarketId,
    /// (price, aggregate quantity), best (highest) first
    pub bids: Vec<(Price, Quantity)>,
    /// (price, aggregate quantity), best (lowest) first
    pub asks: Vec<(Price, Quantity)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_types::ids::AccountId;
    use exchange_types::order::OrderKind;

    fn limit_order(side: Side, price: u64, qty: &str, sequence: u64) -> Order {
        Order::new(
            AccountId::new(),
            MarketId::new("BTC/USDT"),
            side,
            OrderKind::Limit(Price::from_u64(price)),
            Quantity::from_str(qty).unwrap(),
            sequence,
            1708123456789000000,
        )
    }

    #[test]
    fn test_insert_and_contains() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        let order = limit_order(Side::BUY, 50000, "1.0", 1);

        assert!(book.insert(&order));
        assert!(book.contains(&order.order_id));
        assert_eq!(book.order_count(), 1);

        // Duplicate insert refused
        assert!(!book.insert(&order));
    }

    #[test]
    fn test_market_order_never_rests() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        let order = Order::new(
            AccountId::new(),
            MarketId::new("BTC/USDT"),
            Side::BUY,
            OrderKind::Market,
            Quantity::from_str("1.0").unwrap(),
            1,
            0,
        );
        assert!(!book.insert(&order));
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_remove_by_id_without_price() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        let order = limit_order(Side::SELL, 50000, "2.0", 1);
        book.insert(&order);

        let (side, price, entry) = book.remove(&order.order_id).unwrap();
        assert_eq!(side, Side::SELL);
        assert_eq!(price, Price::from_u64(50000));
        assert_eq!(entry.remaining, Quantity::from_str("2.0").unwrap());

        // Second removal reports not-found
        assert!(book.remove(&order.order_id).is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_best_maker_routes_to_opposite_side() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        let bid = limit_order(Side::BUY, 49000, "1.0", 1);
        let ask = limit_order(Side::SELL, 51000, "1.0", 2);
        book.insert(&bid);
        book.insert(&ask);

        let (price, entry) = book.best_maker(Side::BUY).unwrap();
        assert_eq!(price, Price::from_u64(51000));
        assert_eq!(entry.order_id, ask.order_id);

        let (price, entry) = book.best_maker(Side::SELL).unwrap();
        assert_eq!(price, Price::from_u64(49000));
        assert_eq!(entry.order_id, bid.order_id);
    }

    #[test]
    fn test_fill_best_maker_updates_index() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        let ask = limit_order(Side::SELL, 50000, "1.0", 1);
        book.insert(&ask);

        let (_, entry) = book
            .fill_best_maker(Side::BUY, Quantity::from_str("1.0").unwrap())
            .unwrap();
        assert!(entry.remaining.is_zero());
        assert!(!book.contains(&ask.order_id));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_depth_snapshot_shape() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        book.insert(&limit_order(Side::BUY, 49000, "1.0", 1));
        book.insert(&limit_order(Side::BUY, 48000, "2.0", 2));
        book.insert(&limit_order(Side::SELL, 51000, "1.5", 3));

        let snapshot = book.depth_snapshot(10);
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.asks.len(), 1);
        assert_eq!(snapshot.bids[0].0, Price::from_u64(49000));
        assert_eq!(snapshot.asks[0].0, Price::from_u64(51000));
    }

    #[test]
    fn test_queue_at_preserves_arrival_order() {
        let mut book = OrderBook::new(MarketId::new("BTC/USDT"));
        let first = limit_order(Side::BUY, 50000, "1.0", 1);
        let second = limit_order(Side::BUY, 50000, "2.0", 2);
        book.insert(&first);
        book.insert(&second);

        let queue = book.queue_at(Side::BUY, Price::from_u64(50000));
        assert_eq!(queue[0].sequence, 1);
        assert_eq!(queue[1].sequence, 2);
    }
}
