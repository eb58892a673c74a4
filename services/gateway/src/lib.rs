//! Exchange Gateway Service
//!
//! Public façade over the per-pair matching engines: routes place/cancel
//! and read requests to the owning engine, serializes access per pair,
//! maintains per-pair trade history, and fans engine events out to
//! registered sinks.
//!
//! Each pair's engine sits behind its own mutex held for exactly one
//! submit/cancel pipeline, so snapshot and history reads never observe a
//! partially applied match; distinct pairs proceed concurrently. The
//! registry is populated from the asset registry at construction and
//! mutated only by the explicit add/remove pair operations.

pub mod history;
pub mod sink;

pub use history::TradeHistory;
pub use matching_engine::{CancelReport, EngineConfig, ExchangeEvent, SelfTradePolicy};
pub use sink::{EventSink, MemorySink};

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use exchange_types::balance::Balance;
use exchange_types::errors::{ExchangeError, ValidationError};
use exchange_types::ids::{AccountId, MarketId, OrderId};
use exchange_types::numeric::Quantity;
use exchange_types::order::{CancelReason, Order, OrderKind, Side};
use exchange_types::pair::PairSpec;
use exchange_types::trade::Trade;
use matching_engine::book::OrderBookSnapshot;
use matching_engine::{Ledger, MatchingEngine};

/// An order submission as received from the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub account_id: AccountId,
    pub symbol: MarketId,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Quantity,
}

/// Caller-facing outcome of a successful place or cancel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// One pair's engine and history behind their serialization points
struct PairHandle {
    engine: Mutex<MatchingEngine>,
    history: Mutex<TradeHistory>,
}

/// Public-facing exchange façade
pub struct ExchangeGateway {
    ledger: Arc<Mutex<Ledger>>,
    pairs: DashMap<String, Arc<PairHandle>>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
    config: EngineConfig,
}

impl ExchangeGateway {
    /// Build a gateway serving the given registry rows
    pub fn new(registry: Vec<PairSpec>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Build a gateway with explicit engine configuration
    pub fn with_config(registry: Vec<PairSpec>, config: EngineConfig) -> Self {
        let gateway = Self {
            ledger: Arc::new(Mutex::new(Ledger::new())),
            pairs: DashMap::new(),
            sinks: RwLock::new(Vec::new()),
            config,
        };
        for spec in registry {
            gateway.add_pair(spec);
        }
        gateway
    }

    /// Register an event sink; it receives every subsequent event
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sink);
    }

    /// List a new trading pair
    ///
    /// Returns false (and changes nothing) when the symbol is already
    /// listed.
    pub fn add_pair(&self, spec: PairSpec) -> bool {
        let key = spec.symbol.to_string();
        if self.pairs.contains_key(&key) {
            warn!(symbol = %key, "pair already listed");
            return false;
        }
        let engine = MatchingEngine::new(spec, Arc::clone(&self.ledger), self.config.clone());
        self.pairs.insert(
            key.clone(),
            Arc::new(PairHandle {
                engine: Mutex::new(engine),
                history: Mutex::new(TradeHistory::default()),
            }),
        );
        info!(symbol = %key, "pair listed");
        true
    }

    /// Delist a trading pair, cancelling its resting orders
    ///
    /// Every open order is cancelled and its reservation released before
    /// the pair disappears from the registry.
    pub fn remove_pair(&self, symbol: &MarketId) -> Result<Vec<CancelReport>, ExchangeError> {
        let (_, handle) = self
            .pairs
            .remove(symbol.as_str())
            .ok_or_else(|| Self::unknown_symbol(symbol))?;

        let reports = lock(&handle.engine).cancel_all(CancelReason::AdminCancel, now_nanos());
        for report in &reports {
            self.publish(&report.events);
        }
        info!(symbol = %symbol, cancelled = reports.len(), "pair delisted");
        Ok(reports)
    }

    /// Currently listed pairs
    pub fn pairs(&self) -> Vec<MarketId> {
        self.pairs
            .iter()
            .map(|entry| lock(&entry.value().engine).spec().symbol.clone())
            .collect()
    }

    /// Place an order, running the full matching pipeline for its pair
    ///
    /// Validation, funds, and liquidity rejections surface as errors with
    /// no state change; a partially executed market order returns its
    /// trades with the unmet remainder cancelled.
    pub fn place_order(&self, request: OrderRequest) -> Result<OrderReport, ExchangeError> {
        let handle = self.handle(&request.symbol)?;

        let report = lock(&handle.engine).submit_order(
            request.account_id,
            request.side,
            request.kind,
            request.quantity,
            now_nanos(),
        );

        if !report.trades.is_empty() {
            let mut history = lock(&handle.history);
            for trade in &report.trades {
                history.record(trade.clone());
            }
        }
        self.publish(&report.events);

        match report.rejection {
            Some(err) => Err(err),
            None => Ok(OrderReport {
                order: report.order,
                trades: report.trades,
            }),
        }
    }

    /// Cancel a resting order
    ///
    /// A cancel racing a fill observes "not found" and mutates nothing.
    pub fn cancel_order(
        &self,
        symbol: &MarketId,
        order_id: OrderId,
    ) -> Result<OrderReport, ExchangeError> {
        let handle = self.handle(symbol)?;

        let report = lock(&handle.engine).cancel_order(order_id, now_nanos())?;
        self.publish(&report.events);

        Ok(OrderReport {
            order: report.order,
            trades: Vec::new(),
        })
    }

    /// Top-N depth snapshot for one pair
    pub fn order_book_snapshot(
        &self,
        symbol: &MarketId,
        depth: usize,
    ) -> Result<OrderBookSnapshot, ExchangeError> {
        let handle = self.handle(symbol)?;
        let snapshot = lock(&handle.engine).depth_snapshot(depth);
        Ok(snapshot)
    }

    /// Most recent trades for one pair, newest first
    pub fn trade_history(
        &self,
        symbol: &MarketId,
        limit: usize,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let handle = self.handle(symbol)?;
        let trades = lock(&handle.history).recent(limit);
        Ok(trades)
    }

    /// External deposit into the ledger
    pub fn deposit(
        &self,
        account: AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), ExchangeError> {
        lock(&self.ledger).deposit(account, asset, amount)
    }

    /// External withdrawal from available funds
    pub fn withdraw(
        &self,
        account: AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), ExchangeError> {
        lock(&self.ledger).withdraw(account, asset, amount)
    }

    /// Read one balance row
    pub fn balance(&self, account: AccountId, asset: &str) -> Option<Balance> {
        lock(&self.ledger).balance(account, asset).cloned()
    }

    fn handle(&self, symbol: &MarketId) -> Result<Arc<PairHandle>, ExchangeError> {
        self.pairs
            .get(symbol.as_str())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Self::unknown_symbol(symbol))
    }

    fn unknown_symbol(symbol: &MarketId) -> ExchangeError {
        ValidationError::UnknownSymbol(symbol.to_string()).into()
    }

    fn publish(&self, events: &[ExchangeEvent]) {
        let sinks = self
            .sinks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for event in events {
            for sink in sinks.iter() {
                sink.publish(event);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or_default()
}
