//! Market-structure break detection
//!
//! Two layers: a swing-point locator finds strict local extrema over a
//! symmetric window, and break detection signals a close breaching the most
//! recent prior swing extreme. Every break carries the same label; no
//! BOS/CHoCH distinction is computed.

use crate::{
    now_ms, params::AnalysisParams, Annotation, AnnotationKind, Direction, Ohlcv, SwingPoint,
};

/// Scans for closes breaching prior swing extremes.
#[derive(Debug, Clone)]
pub struct StructureBreakDetector {
    /// Symmetric window for swing-point detection, in bars.
    pub swing_lookback: usize,
}

impl Default for StructureBreakDetector {
    fn default() -> Self {
        Self::from_params(&AnalysisParams::default())
    }
}

impl StructureBreakDetector {
    pub fn from_params(params: &AnalysisParams) -> Self {
        Self {
            swing_lookback: params.swing_lookback,
        }
    }

    /// Scan the window for structure breaks against confirmed swing points.
    pub fn scan<T: Ohlcv>(&self, candles: &[T]) -> Vec<Annotation> {
        let mut breaks = Vec::new();

        let swing_highs = find_swing_highs(candles, self.swing_lookback);
        let swing_lows = find_swing_lows(candles, self.swing_lookback);

        for i in self.swing_lookback * 2..candles.len() {
            let bar = &candles[i];

            // Bullish break: close above the most recent prior swing low.
            if let Some(swing) = last_swing_before(&swing_lows, i) {
                if bar.close() > swing.price {
                    breaks.push(make_break(swing.price, bar.time(), i, Direction::Bullish));
                }
            }

            // Bearish break: close below the most recent prior swing high.
            if let Some(swing) = last_swing_before(&swing_highs, i) {
                if bar.close() < swing.price {
                    breaks.push(make_break(swing.price, bar.time(), i, Direction::Bearish));
                }
            }
        }

        breaks
    }
}

fn make_break(level: f64, time: i64, origin_index: usize, direction: Direction) -> Annotation {
    Annotation {
        kind: AnnotationKind::StructureBreak {
            broken_level: level,
        },
        direction,
        price: level,
        time,
        origin_index,
        created_at: now_ms(),
    }
}

/// Bars whose high strictly exceeds every high within `lookback` bars on
/// both sides. Ties disqualify; bars within `lookback` of either end never
/// qualify.
pub(crate) fn find_swing_highs<T: Ohlcv>(candles: &[T], lookback: usize) -> Vec<SwingPoint> {
    let mut swings = Vec::new();

    for i in lookback..candles.len().saturating_sub(lookback) {
        let high = candles[i].high();
        let left = (i - lookback..i).all(|j| candles[j].high() < high);
        if left && (i + 1..=i + lookback).all(|j| candles[j].high() < high) {
            swings.push(SwingPoint {
                price: high,
                index: i,
                time: candles[i].time(),
            });
        }
    }

    swings
}

/// Mirror of [`find_swing_highs`] on lows.
pub(crate) fn find_swing_lows<T: Ohlcv>(candles: &[T], lookback: usize) -> Vec<SwingPoint> {
    let mut swings = Vec::new();

    for i in lookback..candles.len().saturating_sub(lookback) {
        let low = candles[i].low();
        let left = (i - lookback..i).all(|j| candles[j].low() > low);
        if left && (i + 1..=i + lookback).all(|j| candles[j].low() > low) {
            swings.push(SwingPoint {
                price: low,
                index: i,
                time: candles[i].time(),
            });
        }
    }

    swings
}

/// Most recent swing strictly before `index`, if any.
fn last_swing_before(swings: &[SwingPoint], index: usize) -> Option<&SwingPoint> {
    swings.iter().rev().find(|swing| swing.index < index)
}
