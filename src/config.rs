// src/config.rs

use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};

/// Engine-level knobs shared by the detectors. Detector-internal thresholds
/// (volume multipliers, displacement floors) live on the detector structs
/// themselves; these are the options a caller is expected to tune.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub swing_window: usize,         // Centered rolling window for swing highs/lows
    pub ob_lookback: usize,          // Candles on each side of an order-block candidate
    pub bos_lookback: usize,         // Swing window / volume lookback for structure breaks
    pub fvg_volume_multiplier: f64,  // Volume surge factor boosting FVG strength
    pub liquidity_tolerance_pct: f64, // Equal-high/low tolerance as a fraction of price
    pub volume_dot_sigma_medium: f64, // Std-devs above mean volume for a medium dot
    pub volume_dot_sigma_high: f64,   // Std-devs above mean volume for a high dot
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            swing_window: 5,
            ob_lookback: 5,
            bos_lookback: 10,
            fvg_volume_multiplier: 1.5,
            liquidity_tolerance_pct: 0.001, // 0.1% of the bar's own price
            volume_dot_sigma_medium: 1.0,
            volume_dot_sigma_high: 2.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.swing_window == 0 {
            return Err(AnalysisError::Config("swing_window must be > 0".to_string()));
        }
        if self.ob_lookback == 0 {
            return Err(AnalysisError::Config("ob_lookback must be > 0".to_string()));
        }
        if self.bos_lookback == 0 {
            return Err(AnalysisError::Config("bos_lookback must be > 0".to_string()));
        }
        if !(self.fvg_volume_multiplier.is_finite() && self.fvg_volume_multiplier > 0.0) {
            return Err(AnalysisError::Config(
                "fvg_volume_multiplier must be positive".to_string(),
            ));
        }
        if !(self.liquidity_tolerance_pct.is_finite() && self.liquidity_tolerance_pct > 0.0) {
            return Err(AnalysisError::Config(
                "liquidity_tolerance_pct must be positive".to_string(),
            ));
        }
        if !(self.volume_dot_sigma_medium.is_finite()
            && self.volume_dot_sigma_high.is_finite()
            && self.volume_dot_sigma_medium > 0.0
            && self.volume_dot_sigma_high > self.volume_dot_sigma_medium)
        {
            return Err(AnalysisError::Config(
                "volume dot sigma thresholds must satisfy 0 < medium < high".to_string(),
            ));
        }
        Ok(())
    }

    /// Smallest candle count the engine accepts with this configuration.
    /// The structure-break scan is the deepest consumer: it needs two full
    /// swing windows of history plus the bar under test.
    pub fn min_candles(&self) -> usize {
        let bos_need = 2 * self.bos_lookback + 1;
        let ob_need = 2 * self.ob_lookback;
        let liquidity_need = 2 * self.swing_window + 1;
        bos_need.max(ob_need).max(liquidity_need)
    }
}
