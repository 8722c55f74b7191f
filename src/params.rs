//! Analysis parameter set
//!
//! [`AnalysisParams`] is the immutable snapshot of detection thresholds and
//! toggles consumed by one analysis pass. The engine applies whatever values
//! it receives without re-validating them; an out-of-range value degrades
//! detection (e.g. a zero lookback scans nothing) instead of erroring.
//! Configuration providers that want hard validation call
//! [`AnalysisParams::validate`] before handing the snapshot over.
//!
//! Serde field names follow the camelCase convention of the upstream
//! configuration format, so existing JSON config files deserialize directly:
//!
//! ```rust
//! use smcd::params::AnalysisParams;
//!
//! let params: AnalysisParams =
//!     serde_json::from_str(r#"{ "swingLookback": 10 }"#).unwrap();
//! assert_eq!(params.swing_lookback, 10);
//! assert_eq!(params.ob_lookback_period, 50); // everything else defaults
//! ```

use serde::{Deserialize, Serialize};

use crate::{Result, SmcError};

/// Price value of one point. Point-denominated thresholds
/// (`min_fvg_size_points`, `sweep_min_spike_points`) are multiplied by this
/// before being compared against candle prices.
pub const POINT: f64 = 0.0001;

/// Duration of one bar in milliseconds. Bar-denominated settings
/// (`ob_extend_bars`, `fvg_extend_bars`, `delete_objects_older_than`) are
/// translated to elapsed time assuming hourly candles.
pub const BAR_DURATION_MS: i64 = 3_600_000;

/// Detection thresholds and toggles for one analysis pass.
///
/// All fields are public; `Default` yields the stock configuration.
/// Deserialization accepts partial documents, filling the rest from defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisParams {
    /// Truncate the analyzed window to the most recent N candles (0 = no limit).
    pub max_bars_to_calculate: usize,
    /// Retention horizon for zones, in bars (0 = keep everything).
    pub delete_objects_older_than: usize,

    /// Enable the order-block detector.
    pub draw_order_blocks: bool,
    /// Forward-scan window for order-block confirmation, in bars.
    pub ob_lookback_period: usize,
    /// Required impulse size after the origin candle, as a multiple of its range.
    pub min_move_after_ob: f64,
    /// Minimum count of continuation candles inside the forward window.
    pub min_impulse_candles: usize,
    /// Require the impulse to strictly displace beyond the origin extreme.
    pub ob_check_displacement: bool,
    /// Visual extent of order-block zones, in bars.
    pub ob_extend_bars: usize,

    /// Enable the fair-value-gap detector.
    pub draw_fair_value_gaps: bool,
    /// Accepted for configuration compatibility; the gap scan does not consult it.
    pub fvg_lookback_period: usize,
    /// Minimum gap size, in points.
    pub min_fvg_size_points: f64,
    /// Fraction of a zone's height defining its mitigation price (measured
    /// from the low for bullish zones, from the high for bearish ones).
    /// Applied to all zone kinds, order blocks included.
    pub fvg_mitigation_level: f64,
    /// Visual extent of fair-value-gap zones, in bars.
    pub fvg_extend_bars: usize,

    /// Enable the liquidity-sweep detector.
    pub draw_liquidity_sweeps: bool,
    /// Minimum spike beyond the swept level, in points.
    pub sweep_min_spike_points: f64,
    /// Confirmation window for the close back inside the swept range, in bars.
    pub sweep_close_back_candles: usize,

    /// Enable the structure-break detector.
    pub draw_structure: bool,
    /// Symmetric window for swing-point detection, in bars.
    pub swing_lookback: usize,
    /// Accepted for configuration compatibility; break detection does not consult it.
    pub structure_requires_sweep: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            max_bars_to_calculate: 2000,
            delete_objects_older_than: 500,

            draw_order_blocks: true,
            ob_lookback_period: 50,
            min_move_after_ob: 1.0,
            min_impulse_candles: 1,
            ob_check_displacement: true,
            ob_extend_bars: 50,

            draw_fair_value_gaps: true,
            fvg_lookback_period: 50,
            min_fvg_size_points: 10.0,
            fvg_mitigation_level: 0.5,
            fvg_extend_bars: 50,

            draw_liquidity_sweeps: true,
            sweep_min_spike_points: 5.0,
            sweep_close_back_candles: 1,

            draw_structure: true,
            swing_lookback: 15,
            structure_requires_sweep: true,
        }
    }
}

impl AnalysisParams {
    /// Minimum fair-value-gap size in price units.
    #[inline]
    pub fn min_fvg_size(&self) -> f64 {
        self.min_fvg_size_points * POINT
    }

    /// Minimum sweep spike in price units.
    #[inline]
    pub fn sweep_min_spike(&self) -> f64 {
        self.sweep_min_spike_points * POINT
    }

    /// Check every numeric field against its accepted range.
    ///
    /// Returns the first violation as [`SmcError::OutOfRange`]. The engine
    /// never calls this; it exists for external configuration providers.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "maxBarsToCalculate",
            self.max_bars_to_calculate as f64,
            100.0,
            10_000.0,
        )?;
        check_range(
            "deleteObjectsOlderThan",
            self.delete_objects_older_than as f64,
            0.0,
            5000.0,
        )?;
        check_range(
            "obLookbackPeriod",
            self.ob_lookback_period as f64,
            5.0,
            500.0,
        )?;
        check_range("minMoveAfterOB", self.min_move_after_ob, 0.1, 10.0)?;
        check_range(
            "minImpulseCandles",
            self.min_impulse_candles as f64,
            1.0,
            10.0,
        )?;
        check_range(
            "fvgLookbackPeriod",
            self.fvg_lookback_period as f64,
            5.0,
            500.0,
        )?;
        check_range("minFVGSizePoints", self.min_fvg_size_points, 1.0, 1000.0)?;
        check_range("fvgMitigationLevel", self.fvg_mitigation_level, 0.1, 1.0)?;
        check_range(
            "sweepMinSpikePoints",
            self.sweep_min_spike_points,
            1.0,
            100.0,
        )?;
        check_range("swingLookback", self.swing_lookback as f64, 3.0, 100.0)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() {
        return Err(SmcError::InvalidValue("parameter cannot be NaN"));
    }
    if value < min || value > max {
        return Err(SmcError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
