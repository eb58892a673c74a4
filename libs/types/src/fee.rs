//! Fee schedule hook
//!
//! Fee policy is pluggable: the engine asks the schedule for maker and
//! taker fees per fill and deducts them from each party's settlement
//! credit. The default schedule charges nothing.
//!
//! Fees are denominated in the asset each party receives: the base
//! receiver pays fees in base units, the quote receiver in quote units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Proportional maker/taker fee schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Rate applied to the maker's received amount
    pub maker_rate: Decimal,
    /// Rate applied to the taker's received amount
    pub taker_rate: Decimal,
}

impl FeeSchedule {
    /// A schedule that charges no fees
    pub fn free() -> Self {
        Self {
            maker_rate: Decimal::ZERO,
            taker_rate: Decimal::ZERO,
        }
    }

    /// Flat proportional rates for both roles
    pub fn proportional(maker_rate: Decimal, taker_rate: Decimal) -> Self {
        Self {
            maker_rate,
            taker_rate,
        }
    }

    /// Maker fee for a received amount
    pub fn maker_fee(&self, received: Decimal) -> Decimal {
        received * self.maker_rate
    }

    /// Taker fee for a received amount
    pub fn taker_fee(&self, received: Decimal) -> Decimal {
        received * self.taker_rate
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::free()
    }
}
