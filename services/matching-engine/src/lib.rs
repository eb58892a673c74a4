//! Matching Engine Service
//!
//! Price-time priority order matching for one trading pair: a priced
//! order book with FIFO levels, worst-case balance reservation before
//! acceptance, atomic per-fill settlement through the shared ledger,
//! and an ordered event stream for external consumers.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced (best price, then earliest arrival)
//! - Execution price is always the maker's price
//! - Deterministic matching (same inputs → same outputs)
//! - available + locked per (account, asset) conserved by reserve/release/settle

pub mod book;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod matching;

pub use engine::{CancelReport, EngineConfig, MatchingEngine, SelfTradePolicy, SubmitReport};
pub use events::ExchangeEvent;
pub use ledger::Ledger;
