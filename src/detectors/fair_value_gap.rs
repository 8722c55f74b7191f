//! Fair-value-gap detection
//!
//! A fair value gap is a three-candle imbalance: the first and third
//! candles' ranges do not overlap, leaving an untraded window anchored on
//! the middle candle. The gap between the outer ranges becomes a zone.

use crate::{
    now_ms,
    params::{AnalysisParams, BAR_DURATION_MS, POINT},
    Direction, Ohlcv, Zone, ZoneKind, ZoneStatus,
};

/// Scans consecutive candle triples for price imbalances.
#[derive(Debug, Clone)]
pub struct FairValueGapDetector {
    /// Minimum gap size, in price units.
    pub min_size: f64,
    /// Zone extent, in bars.
    pub extend_bars: usize,
}

impl Default for FairValueGapDetector {
    fn default() -> Self {
        Self::from_params(&AnalysisParams::default())
    }
}

impl FairValueGapDetector {
    pub fn from_params(params: &AnalysisParams) -> Self {
        Self {
            min_size: params.min_fvg_size_points * POINT,
            extend_bars: params.fvg_extend_bars,
        }
    }

    /// Scan the window for bullish and bearish gaps.
    pub fn scan<T: Ohlcv>(&self, candles: &[T]) -> Vec<Zone> {
        let mut zones = Vec::new();

        for i in 2..candles.len() {
            let first = &candles[i - 2];
            let middle = &candles[i - 1];
            let last = &candles[i];

            // Bullish gap: the first candle's low clears the last's high.
            let gap = first.low() - last.high();
            if gap > 0.0 && gap >= self.min_size {
                zones.push(self.make_zone(
                    first.low(),
                    last.high(),
                    middle.time(),
                    i - 1,
                    Direction::Bullish,
                ));
            }

            // Bearish gap: the last candle's low clears the first's high.
            let gap = last.low() - first.high();
            if gap > 0.0 && gap >= self.min_size {
                zones.push(self.make_zone(
                    last.low(),
                    first.high(),
                    middle.time(),
                    i - 1,
                    Direction::Bearish,
                ));
            }
        }

        zones
    }

    fn make_zone(
        &self,
        high: f64,
        low: f64,
        time_start: i64,
        origin_index: usize,
        direction: Direction,
    ) -> Zone {
        Zone {
            kind: ZoneKind::FairValueGap,
            direction,
            high,
            low,
            time_start,
            time_end: time_start + self.extend_bars as i64 * BAR_DURATION_MS,
            origin_index,
            status: ZoneStatus::Unmitigated,
            touch_count: 0,
            mitigated_at: None,
            created_at: now_ms(),
        }
    }
}
