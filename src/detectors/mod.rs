//! Smart Money Concepts pattern detectors
//!
//! Four independent scanners over the analyzed candle window:
//!
//! - **Order blocks**: the last opposing candle before an impulsive move.
//! - **Fair value gaps**: three-candle imbalances where the outer candles'
//!   ranges do not overlap.
//! - **Liquidity sweeps**: spikes beyond a recent extreme that close back
//!   inside the swept range.
//! - **Structure breaks**: closes breaching a prior swing extreme.
//!
//! Each detector is a pure function of `(candles, params)`: it holds its own
//! parameter snapshot and depends on no other detector's state. The swing
//! points feeding break detection are located inside the structure module
//! and passed explicitly.

pub mod fair_value_gap;
pub mod liquidity_sweep;
pub mod order_block;
pub mod structure;

// Re-export all detectors for convenience
pub use fair_value_gap::FairValueGapDetector;
pub use liquidity_sweep::{LiquiditySweepDetector, RECENT_LOOKBACK};
pub use order_block::OrderBlockDetector;
pub use structure::StructureBreakDetector;
