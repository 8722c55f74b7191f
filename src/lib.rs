//! # SMCD - Smart Money Concepts Detector
//!
//! Pure detection engine for Smart Money Concepts patterns: order blocks,
//! fair value gaps, liquidity sweeps, and market-structure breaks.
//!
//! One analysis pass is a synchronous batch computation over an ordered,
//! time-ascending candle sequence: the four detectors scan the window, the
//! mitigation tracker advances every zone's lifecycle, stale zones are
//! pruned, and statistics are recomputed. The engine is presentation
//! agnostic; rendering, alert delivery, and configuration persistence live
//! with the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use smcd::prelude::*;
//!
//! // Define your OHLCV data
//! #[derive(Clone)]
//! struct Bar { t: i64, o: f64, h: f64, l: f64, c: f64, v: u64 }
//!
//! impl Ohlcv for Bar {
//!     fn time(&self) -> i64 { self.t }
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//!     fn volume(&self) -> u64 { self.v }
//! }
//!
//! let mut engine = SmcEngine::new();
//! let bars: Vec<Bar> = vec![];
//! let result = engine.analyze(&bars, &AnalysisParams::default());
//! assert!(result.zones.is_empty());
//! ```

pub mod detectors;
pub mod lifecycle;
pub mod params;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::{
            FairValueGapDetector, LiquiditySweepDetector, OrderBlockDetector,
            StructureBreakDetector,
        },
        // Lifecycle
        lifecycle::{retain_recent_zones, update_zone_mitigation},
        // Parameters
        params::{AnalysisParams, BAR_DURATION_MS, POINT},
        // Core types
        AnalysisResult,
        Annotation,
        AnnotationKind,
        Detection,
        Direction,
        Ohlcv,
        OhlcvExt,
        Result,
        SmcEngine,
        // Errors
        SmcError,
        Statistics,
        Zone,
        ZoneKind,
        ZoneStatus,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SmcError>;

/// Errors surfaced by the validation helpers.
///
/// The engine itself never fails: fewer than two candles yields an empty,
/// well-formed result, and out-of-range parameters degrade detection instead
/// of erroring. These variants exist for callers that validate candles or
/// configuration at the boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SmcError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Insufficient data: need {need} candles, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOhlcv { index: usize, reason: &'static str },
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV candle trait.
///
/// The candle store is owned by the caller; the engine only ever reads
/// through this trait. `time` is an epoch-millisecond timestamp and must be
/// non-decreasing across the sequence. Malformed OHLC ordering is the
/// caller's responsibility to prevent upstream ([`OhlcvExt::validate`] is
/// available for that).
pub trait Ohlcv {
    fn time(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> u64;
}

/// Extension trait with computed properties for OHLCV candles
pub trait OhlcvExt: Ohlcv {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        if self.high() < self.low() {
            return Err(SmcError::InvalidOhlcv {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(SmcError::InvalidOhlcv {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(SmcError::InvalidOhlcv {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.open() <= 0.0 || self.close() <= 0.0 || self.low() <= 0.0 {
            return Err(SmcError::InvalidOhlcv {
                index: 0,
                reason: "non-positive price",
            });
        }
        Ok(())
    }
}

impl<T: Ohlcv> OhlcvExt for T {}

// ============================================================
// DIRECTION
// ============================================================

/// Direction of a zone or annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

// ============================================================
// ZONES
// ============================================================

/// Kind of a price-range zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ZoneKind {
    OrderBlock,
    FairValueGap,
}

/// Zone lifecycle status. `Mitigated` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ZoneStatus {
    Unmitigated,
    Mitigated,
}

/// A price-range region with a lifecycle.
///
/// Created by a detector at its origin bar, mutated only by the mitigation
/// tracker (`status`, `touch_count`, `mitigated_at`) and removed only by the
/// retention manager. Never resurrected once mitigated.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub direction: Direction,
    pub high: f64,
    pub low: f64,
    /// Timestamp of the origin bar, epoch ms.
    pub time_start: i64,
    /// End of the zone's visual extent, epoch ms.
    pub time_end: i64,
    /// Position of the origin bar in the analyzed window.
    pub origin_index: usize,
    pub status: ZoneStatus,
    pub touch_count: u32,
    pub mitigated_at: Option<i64>,
    /// Wall-clock creation time, epoch ms.
    pub created_at: i64,
}

impl Zone {
    #[inline]
    pub fn height(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn is_mitigated(&self) -> bool {
        self.status == ZoneStatus::Mitigated
    }

    /// True when the candle's range overlaps the zone's price range.
    #[inline]
    pub fn overlaps<T: Ohlcv>(&self, candle: &T) -> bool {
        candle.low() <= self.high && candle.high() >= self.low
    }

    /// Price at which the zone counts as mitigated: `level` of the height
    /// above the low for bullish zones, below the high for bearish ones.
    /// A level of 1.0 therefore mitigates on any touch; smaller levels
    /// require a deeper fill.
    #[inline]
    pub fn mitigation_price(&self, level: f64) -> f64 {
        match self.direction {
            Direction::Bullish => self.low + self.height() * level,
            Direction::Bearish => self.high - self.height() * level,
        }
    }
}

// ============================================================
// SWING POINTS (crate-internal)
// ============================================================

/// A strict local extremum over a symmetric window of bars.
///
/// Produced by the swing-point locator and consumed by break detection;
/// not part of the public surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SwingPoint {
    pub price: f64,
    pub index: usize,
    pub time: i64,
}

// ============================================================
// ANNOTATIONS
// ============================================================

/// Kind of a point annotation, carrying the referenced price level
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AnnotationKind {
    LiquiditySweep { swept_level: f64 },
    StructureBreak { broken_level: f64 },
}

/// An instantaneous event pinned to a single bar.
///
/// Immutable once created; annotations are recomputed fresh on every pass
/// and never enter the mitigation or retention lifecycle.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub direction: Direction,
    pub price: f64,
    /// Timestamp of the bar the event occurred on, epoch ms.
    pub time: i64,
    /// Position of that bar in the analyzed window.
    pub origin_index: usize,
    /// Wall-clock creation time, epoch ms.
    pub created_at: i64,
}

// ============================================================
// STATISTICS
// ============================================================

/// Counts per detection category, recomputed from the current collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Statistics {
    pub order_blocks: usize,
    pub fair_value_gaps: usize,
    pub liquidity_sweeps: usize,
    pub structure_breaks: usize,
}

impl Statistics {
    /// Tally the current zone and annotation collections.
    pub fn from_collections(zones: &[Zone], annotations: &[Annotation]) -> Self {
        let mut stats = Self::default();
        for zone in zones {
            match zone.kind {
                ZoneKind::OrderBlock => stats.order_blocks += 1,
                ZoneKind::FairValueGap => stats.fair_value_gaps += 1,
            }
        }
        for annotation in annotations {
            match annotation.kind {
                AnnotationKind::LiquiditySweep { .. } => stats.liquidity_sweeps += 1,
                AnnotationKind::StructureBreak { .. } => stats.structure_breaks += 1,
            }
        }
        stats
    }
}

// ============================================================
// DETECTION JOURNAL
// ============================================================

/// Journal entry: a zone or annotation as it looked at creation time.
///
/// Entries are value snapshots -- mitigation applied later in the pass does
/// not rewrite buffered entries.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Detection {
    Zone(Zone),
    Annotation(Annotation),
}

// ============================================================
// ANALYSIS RESULT
// ============================================================

/// The engine's sole output artifact per pass, replacing any previous
/// result held by the caller.
#[derive(Debug, Clone)]
pub struct AnalysisResult<T> {
    /// The caller's full input sequence, untruncated.
    pub candles: Vec<T>,
    pub zones: Vec<Zone>,
    pub annotations: Vec<Annotation>,
    pub statistics: Statistics,
    pub processing_duration: std::time::Duration,
}

// ============================================================
// ENGINE
// ============================================================

use detectors::{
    FairValueGapDetector, LiquiditySweepDetector, OrderBlockDetector, StructureBreakDetector,
};
use params::AnalysisParams;

/// Smart Money Concepts detection engine.
///
/// Stateless across calls except for the surviving zone set, the latest
/// statistics snapshot, and the detection journal. Passes must be serialized
/// by the caller; `&mut self` enforces the single-writer assumption at
/// compile time.
#[derive(Debug, Default)]
pub struct SmcEngine {
    zones: Vec<Zone>,
    journal: Vec<Detection>,
    statistics: Statistics,
}

impl SmcEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one full analysis pass.
    ///
    /// Truncates the analyzed window per `max_bars_to_calculate`, runs the
    /// four detectors (independently, in parallel), then the mitigation
    /// tracker and the retention manager in that order, and recomputes
    /// statistics. Fails softly on fewer than two candles: the result is
    /// empty but well-formed and carries the input candles back.
    pub fn analyze<T>(&mut self, candles: &[T], params: &AnalysisParams) -> AnalysisResult<T>
    where
        T: Ohlcv + Clone + Sync,
    {
        let started = std::time::Instant::now();

        if candles.len() < 2 {
            log::trace!("skipping SMC pass: {} candles", candles.len());
            return AnalysisResult {
                candles: candles.to_vec(),
                zones: Vec::new(),
                annotations: Vec::new(),
                statistics: Statistics::default(),
                processing_duration: started.elapsed(),
            };
        }

        let window =
            if params.max_bars_to_calculate > 0 && candles.len() > params.max_bars_to_calculate {
                &candles[candles.len() - params.max_bars_to_calculate..]
            } else {
                candles
            };

        // The detectors are mutually independent; all four complete before
        // the mitigation tracker runs.
        let (mut zones, annotations) = rayon::join(
            || {
                let (mut blocks, gaps) = rayon::join(
                    || {
                        if params.draw_order_blocks {
                            OrderBlockDetector::from_params(params).scan(window)
                        } else {
                            Vec::new()
                        }
                    },
                    || {
                        if params.draw_fair_value_gaps {
                            FairValueGapDetector::from_params(params).scan(window)
                        } else {
                            Vec::new()
                        }
                    },
                );
                blocks.extend(gaps);
                blocks
            },
            || {
                let (mut sweeps, breaks) = rayon::join(
                    || {
                        if params.draw_liquidity_sweeps {
                            LiquiditySweepDetector::from_params(params).scan(window)
                        } else {
                            Vec::new()
                        }
                    },
                    || {
                        if params.draw_structure {
                            StructureBreakDetector::from_params(params).scan(window)
                        } else {
                            Vec::new()
                        }
                    },
                );
                sweeps.extend(breaks);
                sweeps
            },
        );

        // Journal entries snapshot creation state, before mitigation.
        self.journal
            .extend(zones.iter().cloned().map(Detection::Zone));
        self.journal
            .extend(annotations.iter().cloned().map(Detection::Annotation));

        lifecycle::update_zone_mitigation(&mut zones, window, params.fvg_mitigation_level);
        if let Some(last) = window.last() {
            lifecycle::retain_recent_zones(&mut zones, last.time(), params.delete_objects_older_than);
        }

        self.zones = zones.clone();
        self.statistics = Statistics::from_collections(&self.zones, &annotations);

        let processing_duration = started.elapsed();
        log::debug!(
            "SMC pass completed in {:.2}ms: {} zones, {} annotations",
            processing_duration.as_secs_f64() * 1000.0,
            zones.len(),
            annotations.len(),
        );

        AnalysisResult {
            candles: candles.to_vec(),
            zones,
            annotations,
            statistics: self.statistics,
            processing_duration,
        }
    }

    /// Statistics snapshot of the last pass.
    #[inline]
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Zones surviving the last pass.
    #[inline]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Drain the detection journal: returns every buffered entry and clears
    /// the buffer in one step.
    ///
    /// Entries accumulate across passes until drained; callers that never
    /// drain must expect unbounded growth.
    pub fn drain_new_detections(&mut self) -> Vec<Detection> {
        std::mem::take(&mut self.journal)
    }
}

/// Wall-clock epoch milliseconds for `created_at` stamps.
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BAR_DURATION_MS;

    /// Test OHLCV candle
    #[derive(Debug, Clone, Copy)]
    struct TestCandle {
        t: i64,
        o: f64,
        h: f64,
        l: f64,
        c: f64,
    }

    impl Ohlcv for TestCandle {
        fn time(&self) -> i64 {
            self.t
        }

        fn open(&self) -> f64 {
            self.o
        }

        fn high(&self) -> f64 {
            self.h
        }

        fn low(&self) -> f64 {
            self.l
        }

        fn close(&self) -> f64 {
            self.c
        }

        fn volume(&self) -> u64 {
            1_000
        }
    }

    fn candle(i: usize, o: f64, h: f64, l: f64, c: f64) -> TestCandle {
        TestCandle {
            t: i as i64 * BAR_DURATION_MS,
            o,
            h,
            l,
            c,
        }
    }

    fn flat_series(n: usize) -> Vec<TestCandle> {
        (0..n)
            .map(|i| candle(i, 100.0, 100.0, 100.0, 100.0))
            .collect()
    }

    #[test]
    fn ohlcv_ext() {
        let bar = candle(0, 100.0, 110.0, 90.0, 105.0);
        assert_eq!(bar.body(), 5.0);
        assert_eq!(bar.range(), 20.0);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn ohlcv_validate_rejects_malformed() {
        let bar = TestCandle {
            t: 0,
            o: 100.0,
            h: 90.0,
            l: 110.0,
            c: 100.0,
        };
        assert!(bar.validate().is_err());

        let bar = TestCandle {
            t: 0,
            o: f64::NAN,
            h: 110.0,
            l: 90.0,
            c: 100.0,
        };
        assert!(bar.validate().is_err());
    }

    #[test]
    fn short_input_fails_softly() {
        let mut engine = SmcEngine::new();
        let bars = vec![candle(0, 100.0, 101.0, 99.0, 100.5)];
        let result = engine.analyze(&bars, &AnalysisParams::default());
        assert_eq!(result.candles.len(), 1);
        assert!(result.zones.is_empty());
        assert!(result.annotations.is_empty());
        assert_eq!(result.statistics, Statistics::default());
    }

    #[test]
    fn flat_series_yields_nothing() {
        let mut engine = SmcEngine::new();
        let result = engine.analyze(&flat_series(25), &AnalysisParams::default());
        assert!(result.zones.is_empty());
        assert!(result.annotations.is_empty());
        assert_eq!(result.statistics, Statistics::default());
        assert!(engine.drain_new_detections().is_empty());
    }

    #[test]
    fn journal_drains_once() {
        let mut engine = SmcEngine::new();
        // Three candles forming a clear downside gap.
        let bars = vec![
            candle(0, 1.1120, 1.1130, 1.1100, 1.1110),
            candle(1, 1.1050, 1.1060, 1.0980, 1.1000),
            candle(2, 1.0940, 1.0950, 1.0930, 1.0940),
        ];
        engine.analyze(&bars, &AnalysisParams::default());

        let drained = engine.drain_new_detections();
        assert_eq!(drained.len(), 1);
        assert!(matches!(drained[0], Detection::Zone(_)));
        assert!(engine.drain_new_detections().is_empty());
    }

    #[test]
    fn journal_accumulates_across_passes() {
        let mut engine = SmcEngine::new();
        let bars = vec![
            candle(0, 1.1120, 1.1130, 1.1100, 1.1110),
            candle(1, 1.1050, 1.1060, 1.0980, 1.1000),
            candle(2, 1.0940, 1.0950, 1.0930, 1.0940),
        ];
        let params = AnalysisParams::default();
        engine.analyze(&bars, &params);
        engine.analyze(&bars, &params);
        assert_eq!(engine.drain_new_detections().len(), 2);
    }

    #[test]
    fn journal_snapshots_creation_state() {
        let mut engine = SmcEngine::new();
        // The third candle trades back through the gap and mitigates it, but
        // the journal entry keeps the zone as it was created.
        let bars = vec![
            candle(0, 1.1120, 1.1130, 1.1100, 1.1110),
            candle(1, 1.1050, 1.1060, 1.0980, 1.1000),
            candle(2, 1.0940, 1.0950, 1.0930, 1.0940),
        ];
        let result = engine.analyze(&bars, &AnalysisParams::default());
        assert_eq!(result.zones.len(), 1);
        assert!(result.zones[0].is_mitigated());

        match &engine.drain_new_detections()[0] {
            Detection::Zone(zone) => {
                assert_eq!(zone.status, ZoneStatus::Unmitigated);
                assert_eq!(zone.touch_count, 0);
            }
            other => panic!("expected zone entry, got {other:?}"),
        }
    }

    #[test]
    fn window_truncation_drops_old_patterns() {
        // A gap in the first three bars, then enough flat bars that the
        // truncated window no longer contains it.
        let mut bars = vec![
            candle(0, 1.1120, 1.1130, 1.1100, 1.1110),
            candle(1, 1.1050, 1.1060, 1.0980, 1.1000),
            candle(2, 1.0940, 1.0950, 1.0930, 1.0940),
        ];
        for i in 3..13 {
            bars.push(candle(i, 1.0940, 1.0940, 1.0940, 1.0940));
        }

        let mut params = AnalysisParams::default();
        params.max_bars_to_calculate = 5;

        let mut engine = SmcEngine::new();
        let result = engine.analyze(&bars, &params);
        assert!(result.zones.is_empty());
        // The result still carries the full input back.
        assert_eq!(result.candles.len(), bars.len());
    }

    #[test]
    fn statistics_count_both_collections() {
        let zones = vec![
            Zone {
                kind: ZoneKind::OrderBlock,
                direction: Direction::Bullish,
                high: 101.0,
                low: 100.0,
                time_start: 0,
                time_end: BAR_DURATION_MS,
                origin_index: 0,
                status: ZoneStatus::Unmitigated,
                touch_count: 0,
                mitigated_at: None,
                created_at: 0,
            },
            Zone {
                kind: ZoneKind::FairValueGap,
                direction: Direction::Bearish,
                high: 99.0,
                low: 98.0,
                time_start: 0,
                time_end: BAR_DURATION_MS,
                origin_index: 1,
                status: ZoneStatus::Mitigated,
                touch_count: 2,
                mitigated_at: Some(BAR_DURATION_MS),
                created_at: 0,
            },
        ];
        let annotations = vec![Annotation {
            kind: AnnotationKind::LiquiditySweep { swept_level: 100.5 },
            direction: Direction::Bearish,
            price: 100.9,
            time: 0,
            origin_index: 20,
            created_at: 0,
        }];

        let stats = Statistics::from_collections(&zones, &annotations);
        assert_eq!(stats.order_blocks, 1);
        assert_eq!(stats.fair_value_gaps, 1);
        assert_eq!(stats.liquidity_sweeps, 1);
        assert_eq!(stats.structure_breaks, 0);
    }

    #[test]
    fn engine_state_tracks_last_pass() {
        let mut engine = SmcEngine::new();
        let bars = vec![
            candle(0, 1.1120, 1.1130, 1.1100, 1.1110),
            candle(1, 1.1050, 1.1060, 1.0980, 1.1000),
            candle(2, 1.0940, 1.0950, 1.0930, 1.0940),
        ];
        let result = engine.analyze(&bars, &AnalysisParams::default());
        assert_eq!(engine.zones(), result.zones.as_slice());
        assert_eq!(engine.statistics(), result.statistics);
        assert_eq!(engine.statistics().fair_value_gaps, 1);
    }

    #[test]
    fn zone_mitigation_price() {
        let zone = Zone {
            kind: ZoneKind::OrderBlock,
            direction: Direction::Bullish,
            high: 110.0,
            low: 100.0,
            time_start: 0,
            time_end: BAR_DURATION_MS,
            origin_index: 0,
            status: ZoneStatus::Unmitigated,
            touch_count: 0,
            mitigated_at: None,
            created_at: 0,
        };
        assert_eq!(zone.mitigation_price(0.5), 105.0);

        let bearish = Zone {
            direction: Direction::Bearish,
            ..zone
        };
        assert_eq!(bearish.mitigation_price(0.5), 105.0);
        assert_eq!(bearish.mitigation_price(0.25), 107.5);
    }
}
