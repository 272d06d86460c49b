// src/detectors/stop_run.rs
// Stop runs (liquidity grabs): a wick piercing a prior swing level with the
// close rejected back inside it. This scan is causal: it only consults
// swings already confirmed before the bar under test.

use crate::candle::CandleData;
use crate::errors::AnalysisError;
use crate::swing::{SwingKind, SwingSeries};
use crate::types::{DetectedFeature, StopRunDirection, StopRunFeature};
use log::debug;

pub struct StopRunDetector {
    pub swing_window: usize,     // Centered window used to locate swing levels
    pub probability_scale: f64,  // Pierce depth to probability multiplier
}

impl Default for StopRunDetector {
    fn default() -> Self {
        Self {
            swing_window: 5,
            probability_scale: 1000.0,
        }
    }
}

impl StopRunDetector {
    pub fn detect(&self, candles: &[CandleData]) -> Result<Vec<DetectedFeature>, AnalysisError> {
        let w = self.swing_window;
        let n = candles.len();
        if n < w + 1 {
            return Err(AnalysisError::insufficient(w + 1, n, "stop run detection"));
        }

        let swings = SwingSeries::compute(candles, w)?;
        let points = swings.swing_points(candles);
        let mut features = Vec::new();

        for i in w..n {
            let candle = &candles[i];

            // Swing levels knowable strictly before this bar closed.
            let prior_highs = || {
                points
                    .iter()
                    .filter(move |p| p.kind == SwingKind::High && p.confirmed_at < i)
                    .map(|p| p.price)
            };
            let prior_lows = || {
                points
                    .iter()
                    .filter(move |p| p.kind == SwingKind::Low && p.confirmed_at < i)
                    .map(|p| p.price)
            };

            // Upward run: pierce the nearest swing high below this bar's
            // high, close back under it.
            let nearest_high = prior_highs()
                .filter(|&s| s < candle.high)
                .fold(f64::NEG_INFINITY, f64::max);
            if nearest_high.is_finite() && nearest_high > 0.0 && candle.close < nearest_high {
                let probability =
                    ((candle.high - nearest_high) / nearest_high * self.probability_scale).min(100.0);
                let next_target = prior_highs()
                    .filter(|&s| s > candle.high)
                    .fold(f64::INFINITY, f64::min);
                features.push(DetectedFeature::StopRun(StopRunFeature {
                    bar_index: i,
                    time: candle.time,
                    direction: StopRunDirection::Upward,
                    price_level: candle.high,
                    swept_level: nearest_high,
                    liquidity_grabbed: candle.volume,
                    probability,
                    next_target: next_target.is_finite().then_some(next_target),
                }));
            }

            // Downward mirror against swing lows.
            let nearest_low = prior_lows()
                .filter(|&s| s > candle.low)
                .fold(f64::INFINITY, f64::min);
            if nearest_low.is_finite() && nearest_low > 0.0 && candle.close > nearest_low {
                let probability =
                    ((nearest_low - candle.low) / nearest_low * self.probability_scale).min(100.0);
                let next_target = prior_lows()
                    .filter(|&s| s < candle.low)
                    .fold(f64::NEG_INFINITY, f64::max);
                features.push(DetectedFeature::StopRun(StopRunFeature {
                    bar_index: i,
                    time: candle.time,
                    direction: StopRunDirection::Downward,
                    price_level: candle.low,
                    swept_level: nearest_low,
                    liquidity_grabbed: candle.volume,
                    probability,
                    next_target: next_target.is_finite().then_some(next_target),
                }));
            }
        }

        debug!("[StopRun] {} runs over {} candles", features.len(), n);
        Ok(features)
    }
}
