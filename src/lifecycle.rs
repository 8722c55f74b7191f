//! Zone lifecycle: mitigation tracking and retention
//!
//! Runs strictly after the detectors, mitigation first. The mitigation
//! tracker is the only code that mutates a zone after creation; the
//! retention manager is the only code that removes one.

use crate::{params::BAR_DURATION_MS, Direction, Ohlcv, Zone, ZoneStatus};

/// Advance the lifecycle of every zone against the analyzed window.
///
/// For each zone not yet mitigated, walks candles strictly after its origin
/// bar: every candle overlapping the zone's price range counts as a touch,
/// and a touch reaching the mitigation price (see
/// [`Zone::mitigation_price`]) flips the zone to `Mitigated`, records the
/// candle's timestamp, and stops the walk. The transition is terminal.
pub fn update_zone_mitigation<T: Ohlcv>(zones: &mut [Zone], candles: &[T], level: f64) {
    for zone in zones.iter_mut() {
        if zone.is_mitigated() {
            continue;
        }

        let target = zone.mitigation_price(level);
        for j in zone.origin_index + 1..candles.len() {
            let bar = &candles[j];
            if !zone.overlaps(bar) {
                continue;
            }
            zone.touch_count += 1;

            let reached = match zone.direction {
                Direction::Bullish => bar.low() <= target,
                Direction::Bearish => bar.high() >= target,
            };
            if reached {
                zone.status = ZoneStatus::Mitigated;
                zone.mitigated_at = Some(bar.time());
                break;
            }
        }
    }
}

/// Drop every zone older than the retention horizon.
///
/// The horizon is expressed in bars and translated to elapsed time from the
/// latest candle. Zero keeps everything. Deletion is immediate and
/// irreversible; there is no tombstoning.
pub fn retain_recent_zones(zones: &mut Vec<Zone>, latest_time: i64, horizon_bars: usize) {
    if horizon_bars == 0 {
        return;
    }
    let cutoff = latest_time - horizon_bars as i64 * BAR_DURATION_MS;
    zones.retain(|zone| zone.time_start >= cutoff);
}
