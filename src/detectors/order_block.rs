// src/detectors/order_block.rs
// Order blocks: the last opposite-direction candle before an impulsive,
// volume-backed move. Scoring needs `lookback` bars *after* the candidate,
// so the scan only labels candidates whose full forward window exists;
// `confirmed_through` exposes that decidability boundary to live callers.

use crate::candle::CandleData;
use crate::errors::AnalysisError;
use crate::types::{DetectedFeature, Direction, OrderBlockFeature};
use log::debug;

pub struct OrderBlockDetector {
    pub lookback: usize,             // Bars averaged on each side of the candidate
    pub min_displacement: f64,       // Forward close average must move 0.5% past the candidate open
    pub volume_surge_factor: f64,    // Forward mean volume over trailing mean volume
}

impl Default for OrderBlockDetector {
    fn default() -> Self {
        Self {
            lookback: 5,
            min_displacement: 0.005,
            volume_surge_factor: 1.2,
        }
    }
}

/// Scan result: the confirmed features plus the last bar index whose
/// order-block status was decidable with the configured lookback.
#[derive(Debug)]
pub struct OrderBlockScan {
    pub features: Vec<DetectedFeature>,
    pub confirmed_through: Option<usize>,
}

impl OrderBlockDetector {
    pub fn detect(&self, candles: &[CandleData]) -> Result<OrderBlockScan, AnalysisError> {
        let lookback = self.lookback;
        let n = candles.len();
        let required = 2 * lookback;
        if n < required {
            return Err(AnalysisError::insufficient(required, n, "order block detection"));
        }

        let mut features = Vec::new();

        // Candidate is bar i-1; the windows [i-L, i) and [i, i+L) must both
        // fit, so the last evaluated i is n - lookback.
        for i in lookback..=(n - lookback) {
            let candidate = &candles[i - 1];
            if candidate.open <= 0.0 {
                continue;
            }

            let future_close_avg = mean(candles[i..i + lookback].iter().map(|c| c.close));
            let future_volume_avg = mean(candles[i..i + lookback].iter().map(|c| c.volume));
            let prev_volume_avg = mean(candles[i - lookback..i].iter().map(|c| c.volume));

            if future_volume_avg <= prev_volume_avg * self.volume_surge_factor {
                continue;
            }
            let volume_ratio = if prev_volume_avg > 0.0 {
                future_volume_avg / prev_volume_avg
            } else {
                1.0
            };

            let direction = if candidate.is_bearish()
                && future_close_avg > candidate.open * (1.0 + self.min_displacement)
            {
                Direction::Bullish
            } else if candidate.is_bullish()
                && future_close_avg < candidate.open * (1.0 - self.min_displacement)
            {
                Direction::Bearish
            } else {
                continue;
            };

            let displacement_ratio = (future_close_avg - candidate.open).abs() / candidate.open;
            let strength = (displacement_ratio * volume_ratio * 1000.0).clamp(0.0, 100.0);

            features.push(DetectedFeature::OrderBlock(OrderBlockFeature {
                bar_index: i - 1,
                time: candidate.time,
                direction,
                zone_high: candidate.high,
                zone_low: candidate.low,
                strength,
                displacement_ratio,
                volume_ratio,
            }));
        }

        let confirmed_through = (n - 1).checked_sub(lookback);
        debug!(
            "[OrderBlock] {} blocks over {} candles, confirmed through index {:?}",
            features.len(),
            n,
            confirmed_through
        );

        Ok(OrderBlockScan {
            features,
            confirmed_through,
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(i: usize, open: f64, close: f64, volume: f64) -> CandleData {
        CandleData {
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            open,
            high: open.max(close) + 0.1,
            low: open.min(close) - 0.1,
            close,
            volume,
        }
    }

    /// One bearish candle at index 4, then an impulsive rally on doubled
    /// volume: index 4 must come back as a bullish order block.
    #[test]
    fn flags_last_down_candle_before_rally() {
        let mut candles = Vec::new();
        for i in 0..4 {
            candles.push(candle(i, 100.0, 100.2, 100.0));
        }
        candles.push(candle(4, 100.2, 99.8, 100.0)); // bearish candidate
        for i in 5..10 {
            let base = 101.0 + (i - 5) as f64;
            candles.push(candle(i, base, base + 0.8, 250.0));
        }

        let scan = OrderBlockDetector::default().detect(&candles).unwrap();
        let blocks: Vec<_> = scan
            .features
            .iter()
            .filter_map(|f| match f {
                DetectedFeature::OrderBlock(ob) => Some(ob),
                _ => None,
            })
            .collect();

        assert!(blocks.iter().any(|ob| ob.bar_index == 4 && ob.direction == Direction::Bullish));
        assert_eq!(scan.confirmed_through, Some(4));
    }

    /// Same rally without the volume surge must produce nothing.
    #[test]
    fn requires_volume_confirmation() {
        let mut candles = Vec::new();
        for i in 0..4 {
            candles.push(candle(i, 100.0, 100.2, 100.0));
        }
        candles.push(candle(4, 100.2, 99.8, 100.0));
        for i in 5..10 {
            let base = 101.0 + (i - 5) as f64;
            candles.push(candle(i, base, base + 0.8, 100.0));
        }

        let scan = OrderBlockDetector::default().detect(&candles).unwrap();
        assert!(scan.features.is_empty());
    }

    /// A candidate inside the trailing `lookback` bars has no full forward
    /// window and must be suppressed, not half-evaluated.
    #[test]
    fn suppresses_unconfirmable_tail_candidates() {
        let mut candles = Vec::new();
        for i in 0..8 {
            candles.push(candle(i, 100.0, 100.2, 100.0));
        }
        candles.push(candle(8, 100.2, 99.8, 100.0)); // would-be candidate, only 2 future bars
        candles.push(candle(9, 101.0, 102.0, 400.0));
        candles.push(candle(10, 102.0, 103.0, 400.0));

        let scan = OrderBlockDetector::default().detect(&candles).unwrap();
        assert!(scan.features.iter().all(|f| f.bar_index() != 8));
        assert_eq!(scan.confirmed_through, Some(5));
    }

    #[test]
    fn short_series_is_rejected() {
        let candles: Vec<_> = (0..7).map(|i| candle(i, 100.0, 100.1, 100.0)).collect();
        let err = OrderBlockDetector::default().detect(&candles).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { required: 10, .. }));
    }
}
