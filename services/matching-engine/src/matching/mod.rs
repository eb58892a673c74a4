//! Matching logic module
//!
//! Crossing detection and reservation sizing, kept separate from the
//! engine loop so the price rules stay independently testable.

pub mod crossing;
pub mod reservation;
