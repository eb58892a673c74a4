//! Trading pair specifications
//!
//! One `PairSpec` per market, supplied by the asset registry at startup.
//! The core queries these rows for validation and settlement assets; it
//! does not manage the registry itself.

use crate::ids::MarketId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Specification of one trading pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSpec {
    pub symbol: MarketId,
    pub base_asset: String,
    pub quote_asset: String,
    /// Minimum price increment; limit prices must be a multiple of this
    pub tick_size: Decimal,
    /// Minimum quantity increment; quantities must be a multiple of this
    pub lot_size: Decimal,
    /// Closed pairs reject all new orders
    pub open: bool,
}

impl PairSpec {
    /// Create a spec with the given increments, open for trading.
    ///
    /// Base and quote assets are derived from the symbol.
    pub fn new(symbol: MarketId, tick_size: Decimal, lot_size: Decimal) -> Self {
        let (base, quote) = symbol.split();
        let (base, quote) = (base.to_string(), quote.to_string());
        Self {
            symbol,
            base_asset: base,
            quote_asset: quote,
            tick_size,
            lot_size,
            open: true,
        }
    }

    /// Spec with unit tick and lot sizes, for whole-unit markets and tests
    pub fn with_unit_increments(symbol: MarketId) -> Self {
        Self::new(symbol, Decimal::ONE, Decimal::ONE)
    }

    /// Mark the pair closed for trading
    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    /// Check a limit price against the tick size
    pub fn price_aligned(&self, price: Decimal) -> bool {
        self.tick_size > Decimal::ZERO && (price % self.tick_size).is_zero()
    }

    /// Check a quantity against the lot size
    pub fn quantity_aligned(&self, quantity: Decimal) -> bool {
        self.lot_size > Decimal::ZERO && (quantity % self.lot_size).is_zero()
    }
}
