//! Randomized properties for the matching engine
//!
//! Two invariants under arbitrary order streams on one pair: the book
//! stays sorted by price-then-time after every operation, and
//! available + locked per (account, asset) is conserved by any mix of
//! reserve/release/settle (no deposits or withdrawals mid-stream).

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rust_decimal::Decimal;

use exchange_types::ids::{AccountId, MarketId, OrderId};
use exchange_types::numeric::Price;
use exchange_types::numeric::Quantity;
use exchange_types::order::{OrderKind, Side};
use exchange_types::pair::PairSpec;
use matching_engine::book::OrderBook;
use matching_engine::{EngineConfig, Ledger, MatchingEngine};

const QUOTE_FUNDING: u64 = 100_000_000;
const BASE_FUNDING: u64 = 100_000;

#[derive(Debug, Clone)]
enum Op {
    Limit { account: usize, side: Side, price: u64, qty: u64 },
    Market { account: usize, side: Side, qty: u64 },
    /// Cancel the oldest order still believed to be resting
    CancelOldest,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0usize..3, prop::bool::ANY, 45u64..56, 1u64..5).prop_map(
            |(account, buy, price, qty)| Op::Limit {
                account,
                side: if buy { Side::BUY } else { Side::SELL },
                price: price * 1000,
                qty,
            }
        ),
        2 => (0usize..3, prop::bool::ANY, 1u64..5).prop_map(|(account, buy, qty)| Op::Market {
            account,
            side: if buy { Side::BUY } else { Side::SELL },
            qty,
        }),
        2 => Just(Op::CancelOldest),
    ]
}

struct Harness {
    engine: MatchingEngine,
    ledger: Arc<Mutex<Ledger>>,
    accounts: Vec<AccountId>,
    submitted: Vec<OrderId>,
    clock: i64,
}

impl Harness {
    fn new() -> Self {
        let accounts: Vec<AccountId> = (0..3).map(|_| AccountId::new()).collect();
        let ledger = Arc::new(Mutex::new(Ledger::new()));
        {
            let mut guard = ledger.lock().unwrap();
            for &account in &accounts {
                guard
                    .deposit(account, "USDT", Decimal::from(QUOTE_FUNDING))
                    .unwrap();
                guard
                    .deposit(account, "BTC", Decimal::from(BASE_FUNDING))
                    .unwrap();
            }
        }
        let engine = MatchingEngine::new(
            PairSpec::with_unit_increments(MarketId::new("BTC/USDT")),
            Arc::clone(&ledger),
            EngineConfig::default(),
        );
        Self {
            engine,
            ledger,
            accounts,
            submitted: Vec::new(),
            clock: 0,
        }
    }

    fn apply(&mut self, op: &Op) {
        self.clock += 1;
        match op {
            Op::Limit {
                account,
                side,
                price,
                qty,
            } => {
                let report = self.engine.submit_order(
                    self.accounts[*account],
                    *side,
                    OrderKind::Limit(Price::from_u64(*price)),
                    Quantity::from_u64(*qty),
                    self.clock,
                );
                self.submitted.push(report.order.order_id);
            }
            Op::Market { account, side, qty } => {
                self.engine.submit_order(
                    self.accounts[*account],
                    *side,
                    OrderKind::Market,
                    Quantity::from_u64(*qty),
                    self.clock,
                );
            }
            Op::CancelOldest => {
                if let Some(order_id) = self.submitted.first().copied() {
                    self.submitted.remove(0);
                    // NotFound is a legal outcome: the order may have filled
                    let _ = self.engine.cancel_order(order_id, self.clock);
                }
            }
        }
    }

    fn total(&self, asset: &str) -> Decimal {
        let guard = self.ledger.lock().unwrap();
        self.accounts
            .iter()
            .map(|&account| guard.total(account, asset))
            .sum()
    }

    fn locked(&self, asset: &str) -> Decimal {
        let guard = self.ledger.lock().unwrap();
        self.accounts
            .iter()
            .map(|&account| guard.locked(account, asset))
            .sum()
    }
}

fn assert_price_time_sorted(book: &OrderBook) {
    let bids = book.levels_best_first(Side::BUY);
    for pair in bids.windows(2) {
        assert!(
            pair[0].0 > pair[1].0,
            "bid levels must be strictly descending: {:?}",
            bids
        );
    }
    let asks = book.levels_best_first(Side::SELL);
    for pair in asks.windows(2) {
        assert!(
            pair[0].0 < pair[1].0,
            "ask levels must be strictly ascending: {:?}",
            asks
        );
    }

    for (side, levels) in [(Side::BUY, &bids), (Side::SELL, &asks)] {
        for (price, total) in levels {
            let queue = book.queue_at(side, *price);
            assert!(!queue.is_empty(), "no empty level may remain in the book");
            let queue_total = queue
                .iter()
                .fold(Quantity::zero(), |acc, entry| acc + entry.remaining);
            assert_eq!(queue_total, *total, "level total must match its queue");
            for pair in queue.windows(2) {
                assert!(
                    pair[0].sequence < pair[1].sequence,
                    "queue must be ordered by arrival sequence"
                );
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn book_stays_price_time_sorted(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
            assert_price_time_sorted(harness.engine.book());
        }
    }

    #[test]
    fn balances_conserved_without_deposits(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut harness = Harness::new();
        let base_before = harness.total("BTC");
        let quote_before = harness.total("USDT");

        for op in &ops {
            harness.apply(op);

            // Conservation law: reserve/release/settle never create or
            // destroy funds across the pair's participants
            prop_assert_eq!(harness.total("BTC"), base_before);
            prop_assert_eq!(harness.total("USDT"), quote_before);
        }
    }

    #[test]
    fn locked_funds_match_resting_orders(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);

            // Every locked unit is backed by a resting order and vice
            // versa: quote backs the bids, base backs the asks
            let bid_value: Decimal = harness
                .engine
                .book()
                .levels_best_first(Side::BUY)
                .iter()
                .map(|(price, qty)| price.as_decimal() * qty.as_decimal())
                .sum();
            let ask_quantity: Decimal = harness
                .engine
                .book()
                .levels_best_first(Side::SELL)
                .iter()
                .map(|(_, qty)| qty.as_decimal())
                .sum();

            prop_assert_eq!(harness.locked("USDT"), bid_value);
            prop_assert_eq!(harness.locked("BTC"), ask_quantity);
        }
    }
}
