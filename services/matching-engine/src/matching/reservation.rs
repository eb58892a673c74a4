//! Reservation sizing
//!
//! Computes the worst-case funds an order must lock before it is
//! accepted. Limit orders reserve against their own price; market orders
//! reserve against the opposite-side depth they are projected to
//! consume, walking levels best-first.

use rust_decimal::Decimal;

use exchange_types::order::{Order, OrderKind, Side};
use exchange_types::pair::PairSpec;

use crate::book::OrderBook;

/// Funds an order must hold locked while it can still fill
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub asset: String,
    pub amount: Decimal,
}

/// Compute the reservation for an incoming order
///
/// For market orders the projected amount covers at most the depth
/// currently resting on the opposite side; a zero amount therefore means
/// there is no liquidity to take.
pub fn required(order: &Order, spec: &PairSpec, book: &OrderBook) -> Reservation {
    let remaining = order.remaining_quantity.as_decimal();

    match (order.kind, order.side) {
        (OrderKind::Limit(price), Side::BUY) => Reservation {
            asset: spec.quote_asset.clone(),
            amount: remaining * price.as_decimal(),
        },
        (OrderKind::Limit(_), Side::SELL) => Reservation {
            asset: spec.base_asset.clone(),
            amount: remaining,
        },
        (OrderKind::Market, Side::BUY) => Reservation {
            asset: spec.quote_asset.clone(),
            amount: projected_cost(book, order.side, remaining),
        },
        (OrderKind::Market, Side::SELL) => Reservation {
            asset: spec.base_asset.clone(),
            amount: projected_quantity(book, order.side, remaining),
        },
    }
}

/// Quote cost of the opposite depth a market BUY would consume
fn projected_cost(book: &OrderBook, taker_side: Side, mut needed: Decimal) -> Decimal {
    let mut cost = Decimal::ZERO;
    for (price, quantity) in book.levels_best_first(taker_side.opposite()) {
        if needed <= Decimal::ZERO {
            break;
        }
        let take = needed.min(quantity.as_decimal());
        cost += take * price.as_decimal();
        needed -= take;
    }
    cost
}

/// Base quantity of the opposite depth a market SELL would consume
fn projected_quantity(book: &OrderBook, taker_side: Side, needed: Decimal) -> Decimal {
    let mut fillable = Decimal::ZERO;
    for (_, quantity) in book.levels_best_first(taker_side.opposite()) {
        if fillable >= needed {
            break;
        }
        fillable += quantity.as_decimal();
    }
    fillable.min(needed)
}
