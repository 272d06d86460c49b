// src/detectors/liquidity_zone.rs
// Liquidity zones: volume-confirmed swing points plus equal-high/equal-low
// clusters where resting stops are presumed to sit. Both sub-rules fire
// independently, so one bar may carry several zone annotations.

use crate::candle::CandleData;
use crate::errors::AnalysisError;
use crate::swing::SwingSeries;
use crate::types::{DetectedFeature, LiquidityKind, LiquidityZoneFeature};
use log::debug;

pub struct LiquidityZoneDetector {
    pub swing_window: usize,        // Centered swing window (also sets the edge margin)
    pub volume_surge_factor: f64,   // Swing volume over surrounding-2w mean volume
    pub equal_level_lookback: usize, // Trailing bars scanned for equal highs/lows
    pub tolerance_pct: f64,         // Equal-level tolerance as a fraction of the bar's price
}

impl Default for LiquidityZoneDetector {
    fn default() -> Self {
        Self {
            swing_window: 5,
            volume_surge_factor: 1.5,
            equal_level_lookback: 20,
            tolerance_pct: 0.001,
        }
    }
}

impl LiquidityZoneDetector {
    pub fn detect(&self, candles: &[CandleData]) -> Result<Vec<DetectedFeature>, AnalysisError> {
        let w = self.swing_window;
        let n = candles.len();
        let required = 2 * w + 1;
        if n < required {
            return Err(AnalysisError::insufficient(required, n, "liquidity zone detection"));
        }

        let swings = SwingSeries::compute(candles, w)?;
        let mut features = Vec::new();

        for i in w..(n - w) {
            let candle = &candles[i];
            let surrounding: &[CandleData] = &candles[i - w..i + w];
            let avg_volume =
                surrounding.iter().map(|c| c.volume).sum::<f64>() / surrounding.len() as f64;

            // Rule 1: swing point carrying abnormal volume.
            if candle.volume > avg_volume * self.volume_surge_factor {
                let volume_ratio = if avg_volume > 0.0 {
                    candle.volume / avg_volume
                } else {
                    1.0
                };
                let strength = (volume_ratio * 20.0).min(100.0);

                if swings.rolling_max[i] == Some(candle.high) {
                    features.push(self.zone(i, candle, LiquidityKind::Resistance, candle.high, strength, Some(volume_ratio), None));
                }
                if swings.rolling_min[i] == Some(candle.low) {
                    features.push(self.zone(i, candle, LiquidityKind::Support, candle.low, strength, Some(volume_ratio), None));
                }
            }

            // Rule 2: equal highs/lows inside the trailing lookback window.
            let lo = i.saturating_sub(self.equal_level_lookback);
            let tolerance = candle.high * self.tolerance_pct;

            let equal_highs = candles[lo..i]
                .iter()
                .filter(|c| (c.high - candle.high).abs() <= tolerance)
                .count();
            if equal_highs >= 2 {
                let strength = (equal_highs as f64 * 25.0).min(100.0);
                features.push(self.zone(i, candle, LiquidityKind::EqualHighs, candle.high, strength, None, Some(equal_highs)));
            }

            let equal_lows = candles[lo..i]
                .iter()
                .filter(|c| (c.low - candle.low).abs() <= tolerance)
                .count();
            if equal_lows >= 2 {
                let strength = (equal_lows as f64 * 25.0).min(100.0);
                features.push(self.zone(i, candle, LiquidityKind::EqualLows, candle.low, strength, None, Some(equal_lows)));
            }
        }

        debug!("[Liquidity] {} zones over {} candles", features.len(), n);
        Ok(features)
    }

    #[allow(clippy::too_many_arguments)]
    fn zone(
        &self,
        index: usize,
        candle: &CandleData,
        kind: LiquidityKind,
        price_level: f64,
        strength: f64,
        volume_ratio: Option<f64>,
        equal_level_count: Option<usize>,
    ) -> DetectedFeature {
        DetectedFeature::LiquidityZone(LiquidityZoneFeature {
            bar_index: index,
            time: candle.time,
            kind,
            price_level,
            strength,
            volume_ratio,
            equal_level_count,
        })
    }
}
