//! Per-pair trade history cache
//!
//! Bounded ring of the most recent trades for one pair. Trades are
//! append-only; eviction only drops the oldest entries once the cap is
//! reached.

use std::collections::VecDeque;

use exchange_types::trade::Trade;

/// Default number of trades retained per pair
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// Bounded history of recent trades for one pair
#[derive(Debug)]
pub struct TradeHistory {
    entries: VecDeque<Trade>,
    cap: usize,
}

impl TradeHistory {
    /// Create a history retaining at most `cap` trades
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(DEFAULT_HISTORY_CAP)),
            cap: cap.max(1),
        }
    }

    /// Record a trade, evicting the oldest entry at capacity
    pub fn record(&mut self, trade: Trade) {
        if self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(trade);
    }

    /// The most recent trades, newest first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<Trade> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained trades
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether any trades are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TradeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
