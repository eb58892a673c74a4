//! Ask (sell-side) order book
//!
//! Maintains sell orders sorted by price ascending (best ask first).
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;

use exchange_types::ids::OrderId;
use exchange_types::numeric::{Price, Quantity};

use super::price_level::{BookEntry, PriceLevel};

/// Ask (sell) side order book
///
/// Orders are sorted by price ascending, so the lowest ask is first.
/// At each price level, orders are maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    /// Price levels; BTreeMap iterates ascending, so best ask is first
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    /// Create a new empty ask book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert an entry at the back of its price level's queue
    pub fn insert(&mut self, price: Price, entry: BookEntry) {
        self.levels.entry(price).or_default().insert(entry);
    }

    /// Remove an order from the book, pruning the level if it empties
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<BookEntry> {
        let level = self.levels.get_mut(&price)?;
        let entry = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(entry)
    }

    /// Get the best ask (lowest price) and its aggregate quantity
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Peek the front (oldest) order of the best level
    pub fn peek_front_best(&self) -> Option<(Price, BookEntry)> {
        self.levels
            .iter()
            .next()
            .and_then(|(price, level)| level.peek_front().map(|entry| (*price, *entry)))
    }

    /// Reduce the front order of the best level by `fill`
    ///
    /// Pops the order when its remaining hits zero and prunes the level
    /// when it empties, so the best ask never points at an empty level.
    pub fn fill_front_best(&mut self, fill: Quantity) -> Option<(Price, BookEntry)> {
        let (price, level) = self.levels.iter_mut().next()?;
        let price = *price;
        let updated = level.fill_front(fill)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some((price, updated))
    }

    /// Ordered view of the queue at one price, oldest first
    pub fn queue_at(&self, price: Price) -> Vec<BookEntry> {
        self.levels
            .get(&price)
            .map(|level| level.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All levels best-first (lowest price first)
    pub fn levels_best_first(&self) -> impl Iterator<Item = (Price, Quantity)> + '_ {
        self.levels
            .iter()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Get depth snapshot (top N price levels)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels_best_first().take(depth).collect()
    }

    /// Check if the ask book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_types::ids::AccountId;

    fn entry(sequence: u64, qty: &str) -> BookEntry {
        BookEntry {
            order_id: OrderId::new(),
            account_id: AccountId::new(),
            sequence,
            remaining: Quantity::from_str(qty).unwrap(),
        }
    }

    #[test]
    fn test_ask_book_best_ask_is_lowest() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(50000), entry(1, "1.0"));
        book.insert(Price::from_u64(51000), entry(2, "2.0"));
        book.insert(Price::from_u64(49000), entry(3, "1.5"));

        let (best_price, best_qty) = book.best_ask().unwrap();
        assert_eq!(best_price, Price::from_u64(49000));
        assert_eq!(best_qty, Quantity::from_str("1.5").unwrap());
    }

    #[test]
    fn test_ask_book_remove_prunes_level() {
        let mut book = AskBook::new();
        let e = entry(1, "1.0");
        book.insert(Price::from_u64(50000), e);

        assert!(book.remove(&e.order_id, Price::from_u64(50000)).is_some());
        assert!(book.is_empty());
        assert!(book.remove(&e.order_id, Price::from_u64(50000)).is_none());
    }

    #[test]
    fn test_ask_book_fill_front_best_prunes_level() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(49000), entry(1, "1.0"));
        book.insert(Price::from_u64(50000), entry(2, "2.0"));

        let (price, updated) = book
            .fill_front_best(Quantity::from_str("1.0").unwrap())
            .unwrap();
        assert_eq!(price, Price::from_u64(49000));
        assert!(updated.remaining.is_zero());

        let (next_price, _) = book.best_ask().unwrap();
        assert_eq!(next_price, Price::from_u64(50000));
    }

    #[test]
    fn test_ask_book_depth_snapshot() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(50000), entry(1, "1.0"));
        book.insert(Price::from_u64(51000), entry(2, "2.0"));
        book.insert(Price::from_u64(49000), entry(3, "1.5"));

        let depth = book.depth_snapshot(2);

        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(49000));
        assert_eq!(depth[1].0, Price::from_u64(50000));
    }

    #[test]
    fn test_ask_book_fifo_within_level() {
        let mut book = AskBook::new();
        let first = entry(1, "1.0");
        let second = entry(2, "2.0");
        book.insert(Price::from_u64(50000), first);
        book.insert(Price::from_u64(50000), second);

        let (_, front) = book.peek_front_best().unwrap();
        assert_eq!(front.order_id, first.order_id);
    }
}
