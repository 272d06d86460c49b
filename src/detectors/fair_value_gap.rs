// src/detectors/fair_value_gap.rs
// Fair value gaps: 3-bar price voids the middle bar failed to fill. Gaps
// are recorded as-is; fill tracking is a downstream concern.

use crate::candle::CandleData;
use crate::errors::AnalysisError;
use crate::types::{DetectedFeature, Direction, FvgFeature};
use log::debug;

pub struct FairValueGapDetector {
    pub volume_lookback: usize,   // Trailing bars for the surge baseline
    pub volume_multiplier: f64,   // Surge factor boosting strength by 1.5x
}

impl Default for FairValueGapDetector {
    fn default() -> Self {
        Self {
            volume_lookback: 5,
            volume_multiplier: 1.5,
        }
    }
}

impl FairValueGapDetector {
    pub fn detect(&self, candles: &[CandleData]) -> Result<Vec<DetectedFeature>, AnalysisError> {
        let n = candles.len();
        if n < 3 {
            return Err(AnalysisError::insufficient(3, n, "fair value gap detection"));
        }

        let mut features = Vec::new();

        for i in 2..n {
            let first = &candles[i - 2];
            let middle = &candles[i - 1];
            let current = &candles[i];
            let surge = self.volume_surge(candles, i);

            // Bullish gap: the oldest bar's low sits clear above the current
            // high and the middle bar never reached down into the void.
            if first.low > current.high && middle.low > current.high && middle.high > current.high {
                if current.high > 0.0 {
                    let gap_size_ratio = (first.low - current.high) / current.high;
                    features.push(self.gap(i, current, Direction::Bullish, first.low, current.high, gap_size_ratio, surge));
                }
            }

            // Bearish mirror on highs/lows.
            if first.high < current.low && middle.high < current.low && middle.low < current.low {
                if first.high > 0.0 {
                    let gap_size_ratio = (current.low - first.high) / first.high;
                    features.push(self.gap(i, current, Direction::Bearish, current.low, first.high, gap_size_ratio, surge));
                }
            }
        }

        debug!("[FVG] {} gaps over {} candles", features.len(), n);
        Ok(features)
    }

    /// True only with a full trailing window and a positive mean; an empty
    /// or zero-volume window is no surge, not an error.
    fn volume_surge(&self, candles: &[CandleData], i: usize) -> bool {
        if i < self.volume_lookback {
            return false;
        }
        let window = &candles[i - self.volume_lookback..i];
        let mean = window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64;
        mean > 0.0 && candles[i].volume > mean * self.volume_multiplier
    }

    #[allow(clippy::too_many_arguments)]
    fn gap(
        &self,
        index: usize,
        candle: &CandleData,
        direction: Direction,
        top: f64,
        bottom: f64,
        gap_size_ratio: f64,
        volume_surge: bool,
    ) -> DetectedFeature {
        let mut strength = gap_size_ratio * 1000.0;
        if volume_surge {
            strength *= 1.5;
        }
        DetectedFeature::Fvg(FvgFeature {
            bar_index: index,
            time: candle.time,
            direction,
            top,
            bottom,
            strength: strength.min(100.0),
            gap_size_ratio,
            volume_surge,
        })
    }
}
