//! Matching engine core
//!
//! One engine per trading pair. Each incoming order runs the pipeline
//! validate → reserve → match loop → rest-or-finish as a single unit;
//! the gateway serializes calls per pair, so no second order's
//! reservation or matching is ever observed mid-loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use exchange_types::errors::{ExchangeError, ValidationError};
use exchange_types::fee::FeeSchedule;
use exchange_types::ids::{AccountId, OrderId};
use exchange_types::numeric::Quantity;
use exchange_types::order::{CancelReason, Order, OrderKind, RejectReason, Side};
use exchange_types::pair::PairSpec;
use exchange_types::trade::Trade;

use crate::book::{OrderBook, OrderBookSnapshot};
use crate::events::ExchangeEvent;
use crate::ledger::Ledger;
use crate::matching::{crossing, reservation};

/// Self-trade handling when maker and taker share an account
///
/// This is the single switch governing self-trades. The default allows
/// them: the trade executes and moves funds between the account's own
/// buckets without double-counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfTradePolicy {
    /// Execute the trade normally
    #[default]
    Allow,
    /// Cancel the incoming order's remainder instead of trading
    CancelIncoming,
}

/// Per-engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub self_trade_policy: SelfTradePolicy,
    pub fees: FeeSchedule,
}

/// Outcome of one order submission
///
/// `rejection` carries the precise error when the order was refused
/// (zero-effect rejections) or halted mid-match (invariant faults);
/// completed trades are always preserved alongside it.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub order: Order,
    pub trades: Vec<Trade>,
    pub events: Vec<ExchangeEvent>,
    pub rejection: Option<ExchangeError>,
}

/// Outcome of one cancellation
#[derive(Debug, Clone)]
pub struct CancelReport {
    pub order: Order,
    pub events: Vec<ExchangeEvent>,
}

/// Matching engine for a single trading pair
pub struct MatchingEngine {
    spec: PairSpec,
    book: OrderBook,
    /// Resting orders only; retired orders leave this map
    orders: HashMap<OrderId, Order>,
    ledger: Arc<Mutex<Ledger>>,
    config: EngineConfig,
    /// Arrival sequence for time-priority tie-breaks
    order_sequence: u64,
    /// Per-pair trade sequence
    trade_sequence: u64,
}

impl MatchingEngine {
    /// Create an engine for the given pair
    pub fn new(spec: PairSpec, ledger: Arc<Mutex<Ledger>>, config: EngineConfig) -> Self {
        let book = OrderBook::new(spec.symbol.clone());
        Self {
            spec,
            book,
            orders: HashMap::new(),
            ledger,
            config,
            order_sequence: 0,
            trade_sequence: 0,
        }
    }

    /// The pair specification this engine serves
    pub fn spec(&self) -> &PairSpec {
        &self.spec
    }

    /// Number of resting orders
    pub fn resting_order_count(&self) -> usize {
        self.orders.len()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Submit an order through the full pipeline
    ///
    /// Validation and reservation failures reject the order before any
    /// book or ledger mutation. A settlement fault mid-loop halts this
    /// order only; its completed trades stand.
    pub fn submit_order(
        &mut self,
        account_id: AccountId,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
        timestamp: i64,
    ) -> SubmitReport {
        self.order_sequence += 1;
        let mut order = Order::new(
            account_id,
            self.spec.symbol.clone(),
            side,
            kind,
            quantity,
            self.order_sequence,
            timestamp,
        );
        let mut events = Vec::new();

        // 1. Validate: no state change on failure
        if let Err(validation) = self.validate(&order) {
            let reason = Self::reject_reason(&validation);
            warn!(
                order_id = %order.order_id,
                symbol = %self.spec.symbol,
                reason = ?reason,
                "order rejected by validation"
            );
            order.reject(reason, timestamp);
            events.push(self.rejected_event(&order, reason));
            return SubmitReport {
                order,
                trades: Vec::new(),
                events,
                rejection: Some(validation.into()),
            };
        }

        // 2. Reserve worst-case funds
        let reservation = reservation::required(&order, &self.spec, &self.book);
        if order.kind.is_market() && reservation.amount.is_zero() {
            warn!(
                order_id = %order.order_id,
                symbol = %self.spec.symbol,
                "market order rejected: no opposite liquidity"
            );
            order.reject(RejectReason::NoLiquidity, timestamp);
            events.push(self.rejected_event(&order, RejectReason::NoLiquidity));
            return SubmitReport {
                order,
                trades: Vec::new(),
                events,
                rejection: Some(
                    ValidationError::NoLiquidity(self.spec.symbol.to_string()).into(),
                ),
            };
        }
        if let Err(err) = self
            .ledger()
            .reserve(account_id, &reservation.asset, reservation.amount)
        {
            warn!(
                order_id = %order.order_id,
                symbol = %self.spec.symbol,
                asset = %reservation.asset,
                required = %reservation.amount,
                "order rejected: reservation failed"
            );
            order.reject(RejectReason::InsufficientBalance, timestamp);
            events.push(self.rejected_event(&order, RejectReason::InsufficientBalance));
            return SubmitReport {
                order,
                trades: Vec::new(),
                events,
                rejection: Some(err),
            };
        }
        // Funds still locked for this order; consumed by fills below
        let mut reserved = reservation.amount;

        events.push(ExchangeEvent::OrderAccepted {
            order_id: order.order_id,
            account_id,
            symbol: self.spec.symbol.clone(),
            side,
            kind,
            quantity,
            sequence: order.sequence,
        });
        info!(
            order_id = %order.order_id,
            symbol = %self.spec.symbol,
            side = ?side,
            kind = ?kind,
            quantity = %quantity,
            "order accepted"
        );

        // 3. Match loop
        let mut trades = Vec::new();
        let mut rejection = None;
        let mut stp_cancelled = false;

        while !order.remaining_quantity.is_zero() {
            let Some((maker_price, maker_entry)) = self.book.best_maker(order.side) else {
                break;
            };
            if !crossing::crosses(order.kind, order.side, maker_price) {
                break;
            }

            if maker_entry.account_id == order.account_id
                && self.config.self_trade_policy == SelfTradePolicy::CancelIncoming
            {
                debug!(
                    order_id = %order.order_id,
                    maker_order_id = %maker_entry.order_id,
                    "self-trade prevented, cancelling incoming remainder"
                );
                stp_cancelled = true;
                break;
            }

            let fill = order.remaining_quantity.min(maker_entry.remaining);
            let fill_dec = fill.as_decimal();
            let cost = fill_dec * maker_price.as_decimal();

            // The taker receives base on a BUY and quote on a SELL; each
            // party's fee comes out of what it receives.
            let (buyer, seller, buyer_fee, seller_fee, maker_fee, taker_fee) = match order.side {
                Side::BUY => {
                    let taker_fee = self.config.fees.taker_fee(fill_dec);
                    let maker_fee = self.config.fees.maker_fee(cost);
                    (
                        order.account_id,
                        maker_entry.account_id,
                        taker_fee,
                        maker_fee,
                        maker_fee,
                        taker_fee,
                    )
                }
                Side::SELL => {
                    let taker_fee = self.config.fees.taker_fee(cost);
                    let maker_fee = self.config.fees.maker_fee(fill_dec);
                    (
                        maker_entry.account_id,
                        order.account_id,
                        maker_fee,
                        taker_fee,
                        maker_fee,
                        taker_fee,
                    )
                }
            };

            if let Err(err) = self.ledger().settle(
                buyer,
                seller,
                &self.spec.base_asset,
                &self.spec.quote_asset,
                fill_dec,
                maker_price.as_decimal(),
                buyer_fee,
                seller_fee,
            ) {
                error!(
                    order_id = %order.order_id,
                    maker_order_id = %maker_entry.order_id,
                    symbol = %self.spec.symbol,
                    error = %err,
                    "settlement failed, halting match for this order"
                );
                rejection = Some(err);
                break;
            }

            self.trade_sequence += 1;
            let trade = Trade::new(
                self.trade_sequence,
                self.spec.symbol.clone(),
                maker_entry.order_id,
                order.order_id,
                maker_entry.account_id,
                order.account_id,
                order.side,
                maker_price,
                fill,
                maker_fee,
                taker_fee,
                timestamp,
            );
            events.push(ExchangeEvent::from_trade(&trade));
            trades.push(trade);

            // Taker side: consume reservation, release any price improvement
            order.add_fill(fill, timestamp);
            match order.side {
                Side::BUY => {
                    reserved -= cost;
                    if let OrderKind::Limit(limit_price) = order.kind {
                        let surplus = fill_dec
                            * (limit_price.as_decimal() - maker_price.as_decimal());
                        if surplus > Decimal::ZERO {
                            self.release_or_log(order.account_id, &self.spec.quote_asset, surplus);
                            reserved -= surplus;
                        }
                    }
                }
                Side::SELL => {
                    reserved -= fill_dec;
                }
            }

            // Maker side: mirror the fill into the book and order store
            self.book.fill_best_maker(order.side, fill);
            let maker_filled = match self.orders.get_mut(&maker_entry.order_id) {
                Some(maker_order) => {
                    maker_order.add_fill(fill, timestamp);
                    if maker_order.is_filled() {
                        events.push(ExchangeEvent::OrderFilled {
                            order_id: maker_order.order_id,
                            filled_quantity: maker_order.filled_quantity,
                        });
                        true
                    } else {
                        events.push(ExchangeEvent::OrderPartiallyFilled {
                            order_id: maker_order.order_id,
                            filled_quantity: maker_order.filled_quantity,
                            remaining_quantity: maker_order.remaining_quantity,
                        });
                        false
                    }
                }
                None => {
                    let detail = format!(
                        "maker order {} resting in book but missing from order store",
                        maker_entry.order_id
                    );
                    error!(detail = %detail, symbol = %self.spec.symbol, "book desynchronized");
                    rejection = Some(ExchangeError::InvariantViolation { detail });
                    break;
                }
            };
            if maker_filled {
                self.orders.remove(&maker_entry.order_id);
            }
        }

        // 4. Rest or finish
        if rejection.is_some() || stp_cancelled {
            let reason = if stp_cancelled {
                CancelReason::SelfTrade
            } else {
                CancelReason::SettlementFault
            };
            self.discard_remainder(&mut order, &mut reserved, &reservation.asset, reason, timestamp, &mut events);
        } else if !order.remaining_quantity.is_zero() {
            match order.kind {
                OrderKind::Limit(_) => {
                    self.book.insert(&order);
                    self.orders.insert(order.order_id, order.clone());
                    debug!(
                        order_id = %order.order_id,
                        remaining = %order.remaining_quantity,
                        "order resting on book"
                    );
                }
                OrderKind::Market => {
                    // Market orders never rest; the unmet remainder is
                    // discarded and its surplus reservation released
                    self.discard_remainder(
                        &mut order,
                        &mut reserved,
                        &reservation.asset,
                        CancelReason::UnfilledMarketRemainder,
                        timestamp,
                        &mut events,
                    );
                }
            }
        }

        if order.has_fills() {
            if order.is_filled() {
                events.push(ExchangeEvent::OrderFilled {
                    order_id: order.order_id,
                    filled_quantity: order.filled_quantity,
                });
            } else {
                events.push(ExchangeEvent::OrderPartiallyFilled {
                    order_id: order.order_id,
                    filled_quantity: order.filled_quantity,
                    remaining_quantity: order.remaining_quantity,
                });
            }
        }

        SubmitReport {
            order,
            trades,
            events,
            rejection,
        }
    }

    /// Cancel a resting order and release its remaining reservation
    ///
    /// Unknown or already-retired ids (including fills that raced the
    /// cancel) report `NotFound` and mutate nothing.
    pub fn cancel_order(&mut self, order_id: OrderId, timestamp: i64) -> Result<CancelReport, ExchangeError> {
        self.cancel_with_reason(order_id, CancelReason::UserRequested, timestamp)
    }

    /// Cancel every resting order, e.g. when the pair is delisted
    pub fn cancel_all(&mut self, reason: CancelReason, timestamp: i64) -> Vec<CancelReport> {
        let ids: Vec<OrderId> = self.orders.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.cancel_with_reason(id, reason, timestamp).ok())
            .collect()
    }

    fn cancel_with_reason(
        &mut self,
        order_id: OrderId,
        reason: CancelReason,
        timestamp: i64,
    ) -> Result<CancelReport, ExchangeError> {
        if self.book.remove(&order_id).is_none() {
            return Err(ExchangeError::NotFound { order_id });
        }
        let Some(mut order) = self.orders.remove(&order_id) else {
            let detail = format!("order {order_id} was in book but missing from order store");
            error!(detail = %detail, symbol = %self.spec.symbol, "book desynchronized");
            return Err(ExchangeError::InvariantViolation { detail });
        };

        let (asset, amount) = self.resting_reservation(&order);
        if amount > Decimal::ZERO {
            self.ledger().release(order.account_id, &asset, amount)?;
        }

        order.cancel(reason, timestamp);
        info!(
            order_id = %order.order_id,
            symbol = %self.spec.symbol,
            reason = ?reason,
            released = %amount,
            "order cancelled"
        );

        let events = vec![ExchangeEvent::OrderCancelled {
            order_id: order.order_id,
            symbol: self.spec.symbol.clone(),
            side: order.side,
            remaining_quantity: order.remaining_quantity,
            reason,
        }];
        Ok(CancelReport { order, events })
    }

    /// Top-N depth snapshot of the book
    pub fn depth_snapshot(&self, depth: usize) -> OrderBookSnapshot {
        self.book.depth_snapshot(depth)
    }

    /// Read access to the book for reservation walks and diagnostics
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    fn validate(&self, order: &Order) -> Result<(), ValidationError> {
        if !self.spec.open {
            return Err(ValidationError::MarketClosed(self.spec.symbol.to_string()));
        }
        let quantity = order.quantity.as_decimal();
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidQuantity(format!(
                "quantity {quantity} must be positive"
            )));
        }
        if !self.spec.quantity_aligned(quantity) {
            return Err(ValidationError::InvalidQuantity(format!(
                "quantity {quantity} not aligned to lot size {}",
                self.spec.lot_size
            )));
        }
        if let OrderKind::Limit(price) = order.kind {
            if !self.spec.price_aligned(price.as_decimal()) {
                return Err(ValidationError::InvalidPrice(format!(
                    "price {price} not aligned to tick size {}",
                    self.spec.tick_size
                )));
            }
        }
        Ok(())
    }

    fn reject_reason(validation: &ValidationError) -> RejectReason {
        match validation {
            ValidationError::InvalidQuantity(_) => RejectReason::InvalidQuantity,
            ValidationError::InvalidPrice(_) => RejectReason::InvalidPrice,
            ValidationError::UnknownSymbol(_) => RejectReason::UnknownSymbol,
            ValidationError::MarketClosed(_) => RejectReason::MarketClosed,
            ValidationError::NoLiquidity(_) => RejectReason::NoLiquidity,
        }
    }

    fn rejected_event(&self, order: &Order, reason: RejectReason) -> ExchangeEvent {
        ExchangeEvent::OrderRejected {
            order_id: order.order_id,
            account_id: order.account_id,
            symbol: self.spec.symbol.clone(),
            reason,
        }
    }

    /// Remaining reservation held by a resting order
    fn resting_reservation(&self, order: &Order) -> (String, Decimal) {
        match (order.kind, order.side) {
            (OrderKind::Limit(price), Side::BUY) => (
                self.spec.quote_asset.clone(),
                order.remaining_quantity.as_decimal() * price.as_decimal(),
            ),
            _ => (
                self.spec.base_asset.clone(),
                order.remaining_quantity.as_decimal(),
            ),
        }
    }

    /// Discard an incoming order's unfilled remainder and release the
    /// reservation still backing it
    fn discard_remainder(
        &self,
        order: &mut Order,
        reserved: &mut Decimal,
        asset: &str,
        reason: CancelReason,
        timestamp: i64,
        events: &mut Vec<ExchangeEvent>,
    ) {
        if *reserved > Decimal::ZERO {
            self.release_or_log(order.account_id, asset, *reserved);
            *reserved = Decimal::ZERO;
        }
        // A halted order can already be terminal (filled on its last
        // iteration); only an open remainder gets cancelled
        if !order.status.is_terminal() {
            order.cancel(reason, timestamp);
            events.push(ExchangeEvent::OrderCancelled {
                order_id: order.order_id,
                symbol: self.spec.symbol.clone(),
                side: order.side,
                remaining_quantity: order.remaining_quantity,
                reason,
            });
        }
    }

    fn release_or_log(&self, account: AccountId, asset: &str, amount: Decimal) {
        if let Err(err) = self.ledger().release(account, asset, amount) {
            error!(
                account = %account,
                asset = %asset,
                amount = %amount,
                error = %err,
                "reservation release failed"
            );
        }
    }
}
