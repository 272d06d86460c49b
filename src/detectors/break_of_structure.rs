// src/detectors/break_of_structure.rs
// Break of structure: a close pushing past the swing extremes of the
// previous structure window, confirmed by volume.

use crate::candle::CandleData;
use crate::errors::AnalysisError;
use crate::swing::SwingSeries;
use crate::types::{BosFeature, DetectedFeature, Direction};
use log::debug;

pub struct BreakOfStructureDetector {
    pub lookback: usize,           // Swing window size and trailing volume window
    pub volume_surge_factor: f64,  // Break volume over trailing mean volume
}

impl Default for BreakOfStructureDetector {
    fn default() -> Self {
        Self {
            lookback: 10,
            volume_surge_factor: 1.3,
        }
    }
}

impl BreakOfStructureDetector {
    pub fn detect(&self, candles: &[CandleData]) -> Result<Vec<DetectedFeature>, AnalysisError> {
        let lookback = self.lookback;
        let n = candles.len();
        let required = 2 * lookback + 1;
        if n < required {
            return Err(AnalysisError::insufficient(required, n, "break of structure detection"));
        }

        let swings = SwingSeries::compute(candles, lookback)?;
        let mut features = Vec::new();

        for i in (2 * lookback)..n {
            let candle = &candles[i];
            let trailing = &candles[i - lookback..i];
            let avg_volume = trailing.iter().map(|c| c.volume).sum::<f64>() / trailing.len() as f64;
            if candle.volume <= avg_volume * self.volume_surge_factor {
                continue;
            }
            let volume_ratio = if avg_volume > 0.0 {
                candle.volume / avg_volume
            } else {
                1.0
            };

            // Structure window: swing extremes one lookback behind the
            // trailing volume window.
            let window = (i - 2 * lookback)..(i - lookback);

            let highest_swing = swings.rolling_max[window.clone()]
                .iter()
                .flatten()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            if highest_swing.is_finite() && candle.close > highest_swing && highest_swing > 0.0 {
                let price_strength = (candle.close - highest_swing) / highest_swing;
                features.push(self.breakout(i, candle, Direction::Bullish, highest_swing, price_strength, volume_ratio));
            }

            let lowest_swing = swings.rolling_min[window]
                .iter()
                .flatten()
                .copied()
                .fold(f64::INFINITY, f64::min);
            if lowest_swing.is_finite() && candle.close < lowest_swing && lowest_swing > 0.0 {
                let price_strength = (lowest_swing - candle.close) / lowest_swing;
                features.push(self.breakout(i, candle, Direction::Bearish, lowest_swing, price_strength, volume_ratio));
            }
        }

        debug!("[BOS] {} breaks over {} candles", features.len(), n);
        Ok(features)
    }

    fn breakout(
        &self,
        index: usize,
        candle: &CandleData,
        direction: Direction,
        broken_level: f64,
        price_strength: f64,
        volume_ratio: f64,
    ) -> DetectedFeature {
        DetectedFeature::Bos(BosFeature {
            bar_index: index,
            time: candle.time,
            direction,
            broken_level,
            close: candle.close,
            strength: (price_strength * volume_ratio * 100.0).clamp(0.0, 100.0),
            volume_ratio,
        })
    }
}
