//! Price level implementation with FIFO queue
//!
//! A price level contains all resting orders at a specific price point.
//! Orders are maintained in FIFO order to enforce time priority: the
//! front of the queue is always the oldest arrival at that price.

use std::collections::VecDeque;

use exchange_types::ids::{AccountId, OrderId};
use exchange_types::numeric::Quantity;

/// One resting order's entry in a price level queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub account_id: AccountId,
    /// Arrival sequence number (time-priority tie-break)
    pub sequence: u64,
    pub remaining: Quantity,
}

/// A price level containing orders at a specific price
///
/// Maintains strict FIFO ordering for time-priority matching.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<BookEntry>,
    /// Total quantity resting at this level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn insert(&mut self, entry: BookEntry) {
        self.total_quantity = self.total_quantity + entry.remaining;
        self.orders.push_back(entry);
    }

    /// Remove an order from the queue by OrderId
    ///
    /// Returns the removed entry, or None if not found
    pub fn remove(&mut self, order_id: &OrderId) -> Option<BookEntry> {
        let position = self
            .orders
            .iter()
            .position(|entry| &entry.order_id == order_id)?;
        let entry = self.orders.remove(position)?;

        self.total_quantity = self.total_quantity.saturating_sub(entry.remaining);

        Some(entry)
    }

    /// Peek at the front order without removing it
    pub fn peek_front(&self) -> Option<&BookEntry> {
        self.orders.front()
    }

    /// Reduce the front order's remaining quantity by `fill`
    ///
    /// Removes the order from the queue when its remaining hits zero.
    /// Returns the updated entry, or None if the level is empty.
    pub fn fill_front(&mut self, fill: Quantity) -> Option<BookEntry> {
        let entry = self.orders.front_mut()?;
        entry.remaining = entry.remaining.saturating_sub(fill);
        self.total_quantity = self.total_quantity.saturating_sub(fill);

        let updated = *entry;
        if updated.remaining.is_zero() {
            self.orders.pop_front();
        }
        Some(updated)
    }

    /// Front-to-back view of the queue (oldest to newest)
    pub fn iter(&self) -> impl Iterator<Item = &BookEntry> {
        self.orders.iter()
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Get the number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
