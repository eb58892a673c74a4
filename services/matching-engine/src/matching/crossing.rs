//! Crossing detection logic
//!
//! Determines when an incoming order can match the best opposite level.
//! A BUY crosses when its price is at or above the resting ask; a SELL
//! crosses at or below the resting bid. Market orders cross any price.

use exchange_types::numeric::Price;
use exchange_types::order::{OrderKind, Side};

/// Check if an incoming order crosses the best opposite price
pub fn crosses(kind: OrderKind, side: Side, best_opposite: Price) -> bool {
    match kind {
        OrderKind::Market => true,
        OrderKind::Limit(price) => match side {
            Side::BUY => price >= best_opposite,
            Side::SELL => price <= best_opposite,
        },
    }
}
