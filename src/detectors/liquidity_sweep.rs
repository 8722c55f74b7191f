//! Liquidity-sweep detection
//!
//! A sweep is a brief spike beyond a recent extreme that quickly reverses:
//! price takes out resting stops above a recent high (or below a recent
//! low), then closes back inside the swept range within a few bars.

use crate::{
    now_ms,
    params::{AnalysisParams, POINT},
    Annotation, AnnotationKind, Direction, Ohlcv,
};

/// Fixed short-term window defining "recent" extremes, in bars.
///
/// A swept level drops out of this window on the following scans, so no
/// dedup state is needed: only the first qualifying bar triggers.
pub const RECENT_LOOKBACK: usize = 20;

/// Scans for spikes through recent extremes confirmed by a close back.
#[derive(Debug, Clone)]
pub struct LiquiditySweepDetector {
    /// Minimum spike beyond the swept level, in price units.
    pub min_spike: f64,
    /// Confirmation window for the close back, in bars.
    pub close_back_candles: usize,
}

impl Default for LiquiditySweepDetector {
    fn default() -> Self {
        Self::from_params(&AnalysisParams::default())
    }
}

impl LiquiditySweepDetector {
    pub fn from_params(params: &AnalysisParams) -> Self {
        Self {
            min_spike: params.sweep_min_spike_points * POINT,
            close_back_candles: params.sweep_close_back_candles.max(1),
        }
    }

    /// Scan the window for sweeps of recent highs and lows.
    pub fn scan<T: Ohlcv>(&self, candles: &[T]) -> Vec<Annotation> {
        let mut sweeps = Vec::new();

        for i in RECENT_LOOKBACK..candles.len().saturating_sub(self.close_back_candles) {
            let bar = &candles[i];

            // Reference extremes strictly before bar i.
            let mut recent_high = f64::MIN;
            let mut recent_low = f64::MAX;
            for prior in &candles[i - RECENT_LOOKBACK..i] {
                recent_high = recent_high.max(prior.high());
                recent_low = recent_low.min(prior.low());
            }

            // Bearish sweep: spike above the recent high, then a close at or
            // below the swept level.
            let spike = bar.high() - recent_high;
            if spike > 0.0
                && spike >= self.min_spike
                && self.closes_back(candles, i, |close| close <= recent_high)
            {
                sweeps.push(Annotation {
                    kind: AnnotationKind::LiquiditySweep {
                        swept_level: recent_high,
                    },
                    direction: Direction::Bearish,
                    price: bar.high(),
                    time: bar.time(),
                    origin_index: i,
                    created_at: now_ms(),
                });
            }

            // Bullish sweep: mirror below the recent low.
            let spike = recent_low - bar.low();
            if spike > 0.0
                && spike >= self.min_spike
                && self.closes_back(candles, i, |close| close >= recent_low)
            {
                sweeps.push(Annotation {
                    kind: AnnotationKind::LiquiditySweep {
                        swept_level: recent_low,
                    },
                    direction: Direction::Bullish,
                    price: bar.low(),
                    time: bar.time(),
                    origin_index: i,
                    created_at: now_ms(),
                });
            }
        }

        sweeps
    }

    /// True when any close within the confirmation window after `index`
    /// satisfies the rejection predicate.
    fn closes_back<T: Ohlcv>(
        &self,
        candles: &[T],
        index: usize,
        rejected: impl Fn(f64) -> bool,
    ) -> bool {
        let end = (index + self.close_back_candles).min(candles.len().saturating_sub(1));
        (index + 1..=end).any(|j| rejected(candles[j].close()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BAR_DURATION_MS;

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

    /// Twenty quiet bars: highs at 100.5, lows at 99.5.
    fn quiet_preamble() -> Vec<TestCandle> {
        (0..RECENT_LOOKBACK)
            .map(|i| candle(i, 100.0, 100.5, 99.5, 100.1))
            .collect()
    }

    fn detector() -> LiquiditySweepDetector {
        LiquiditySweepDetector {
            min_spike: 5.0 * POINT,
            close_back_candles: 1,
        }
    }

    #[test]
    fn detects_bearish_sweep_of_recent_high() {
        let mut bars = quiet_preamble();
        bars.push(candle(20, 100.0, 101.0, 99.8, 100.9)); // spike above 100.5
        bars.push(candle(21, 100.9, 100.9, 99.0, 100.2)); // closes back below

        let sweeps = detector().scan(&bars);
        assert_eq!(sweeps.len(), 1);

        let sweep = &sweeps[0];
        assert_eq!(sweep.direction, Direction::Bearish);
        assert_eq!(sweep.price, 101.0);
        assert_eq!(sweep.origin_index, 20);
        assert_eq!(sweep.time, 20 * BAR_DURATION_MS);
        match sweep.kind {
            AnnotationKind::LiquiditySweep { swept_level } => assert_eq!(swept_level, 100.5),
            other => panic!("expected sweep, got {other:?}"),
        }
    }

    #[test]
    fn detects_bullish_sweep_of_recent_low() {
        let mut bars = quiet_preamble();
        bars.push(candle(20, 100.0, 100.2, 99.0, 99.1)); // spike below 99.5
        bars.push(candle(21, 99.1, 100.3, 99.0, 100.0)); // closes back above

        let sweeps = detector().scan(&bars);
        assert_eq!(sweeps.len(), 1);
        assert_eq!(sweeps[0].direction, Direction::Bullish);
        assert_eq!(sweeps[0].price, 99.0);
        match sweeps[0].kind {
            AnnotationKind::LiquiditySweep { swept_level } => assert_eq!(swept_level, 99.5),
            other => panic!("expected sweep, got {other:?}"),
        }
    }

    #[test]
    fn requires_close_back_confirmation() {
        let mut bars = quiet_preamble();
        bars.push(candle(20, 100.0, 101.0, 99.8, 100.9));
        bars.push(candle(21, 100.9, 101.5, 100.8, 101.2)); // keeps closing above

        assert!(detector().scan(&bars).is_empty());
    }

    #[test]
    fn close_back_window_extends_confirmation() {
        let mut bars = quiet_preamble();
        bars.push(candle(20, 100.0, 101.0, 99.8, 100.9));
        bars.push(candle(21, 100.9, 101.0, 100.8, 100.9)); // not yet
        bars.push(candle(22, 100.9, 101.0, 100.0, 100.2)); // rejection two bars later

        assert!(detector().scan(&bars).is_empty());

        let mut wide = detector();
        wide.close_back_candles = 2;
        let sweeps = wide.scan(&bars);
        assert_eq!(sweeps.len(), 1);
        assert_eq!(sweeps[0].origin_index, 20);
    }

    #[test]
    fn rejects_spike_below_minimum() {
        let mut bars = quiet_preamble();
        // Spike of 0.0003 over the recent high.
        bars.push(candle(20, 100.0, 100.5003, 99.8, 100.2));
        bars.push(candle(21, 100.2, 100.4, 99.8, 100.1));

        assert!(detector().scan(&bars).is_empty());
    }

    #[test]
    fn flat_series_has_no_sweeps() {
        let bars: Vec<_> = (0..30)
            .map(|i| candle(i, 100.0, 100.0, 100.0, 100.0))
            .collect();
        assert!(detector().scan(&bars).is_empty());
    }

    #[test]
    fn short_series_scans_nothing() {
        assert!(detector().scan(&quiet_preamble()).is_empty());
    }
}
