//! Order-block detection
//!
//! An order block is a candle preceding a strong impulsive move in the
//! opposite direction of its own body: the last down candle before a rally
//! (bullish block) or the last up candle before a drop (bearish block). The
//! candle's full range becomes a supply/demand zone expected to cause a
//! reaction on retest.

use crate::{
    now_ms,
    params::{AnalysisParams, BAR_DURATION_MS},
    Direction, Ohlcv, OhlcvExt, Zone, ZoneKind, ZoneStatus,
};

/// Scans for order blocks confirmed by a forward impulse.
#[derive(Debug, Clone)]
pub struct OrderBlockDetector {
    /// Forward-scan window, in bars.
    pub lookback: usize,
    /// Required impulse size as a multiple of the origin candle's range.
    pub min_move: f64,
    /// Minimum count of continuation candles inside the window.
    pub min_impulse_candles: usize,
    /// Require the impulse to strictly exceed the origin extreme.
    pub check_displacement: bool,
    /// Zone extent, in bars.
    pub extend_bars: usize,
}

impl Default for OrderBlockDetector {
    fn default() -> Self {
        Self::from_params(&AnalysisParams::default())
    }
}

impl OrderBlockDetector {
    pub fn from_params(params: &AnalysisParams) -> Self {
        Self {
            lookback: params.ob_lookback_period,
            min_move: params.min_move_after_ob,
            min_impulse_candles: params.min_impulse_candles.max(1),
            check_displacement: params.ob_check_displacement,
            extend_bars: params.ob_extend_bars,
        }
    }

    /// Scan the window for bullish and bearish order blocks.
    pub fn scan<T: Ohlcv>(&self, candles: &[T]) -> Vec<Zone> {
        let mut zones = Vec::new();

        for i in self.lookback..candles.len().saturating_sub(1) {
            if self.is_bullish_block(candles, i) {
                zones.push(self.make_zone(&candles[i], i, Direction::Bullish));
            }
            if self.is_bearish_block(candles, i) {
                zones.push(self.make_zone(&candles[i], i, Direction::Bearish));
            }
        }

        zones
    }

    /// A bearish candle whose high is displaced by a sufficient up-move
    /// within the forward window.
    fn is_bullish_block<T: Ohlcv>(&self, candles: &[T], index: usize) -> bool {
        let origin = &candles[index];
        if !origin.is_bearish() {
            return false;
        }

        let mut max_high = origin.high();
        let mut impulse = 0.0;
        let mut continuation = 0usize;

        let end = (index + self.lookback).min(candles.len());
        for j in index + 1..end {
            let bar = &candles[j];
            if bar.is_bullish() {
                continuation += 1;
            }
            if bar.high() > max_high {
                max_high = bar.high();
                impulse = max_high - origin.high();
            }
        }

        if impulse < origin.range() * self.min_move {
            return false;
        }
        if self.check_displacement && max_high <= origin.high() {
            return false;
        }
        continuation >= self.min_impulse_candles
    }

    /// Mirror condition: a bullish candle displaced by a down-move.
    fn is_bearish_block<T: Ohlcv>(&self, candles: &[T], index: usize) -> bool {
        let origin = &candles[index];
        if !origin.is_bullish() {
            return false;
        }

        let mut min_low = origin.low();
        let mut impulse = 0.0;
        let mut continuation = 0usize;

        let end = (index + self.lookback).min(candles.len());
        for j in index + 1..end {
            let bar = &candles[j];
            if bar.is_bearish() {
                continuation += 1;
            }
            if bar.low() < min_low {
                min_low = bar.low();
                impulse = origin.low() - min_low;
            }
        }

        if impulse < origin.range() * self.min_move {
            return false;
        }
        if self.check_displacement && min_low >= origin.low() {
            return false;
        }
        continuation >= self.min_impulse_candles
    }

    fn make_zone<T: Ohlcv>(&self, origin: &T, index: usize, direction: Direction) -> Zone {
        let time_start = origin.time();
        Zone {
            kind: ZoneKind::OrderBlock,
            direction,
            high: origin.high(),
            low: origin.low(),
            time_start,
            time_end: time_start + self.extend_bars as i64 * BAR_DURATION_MS,
            origin_index: index,
            status: ZoneStatus::Unmitigated,
            touch_count: 0,
            mitigated_at: None,
            created_at: now_ms(),
        }
    }
}
