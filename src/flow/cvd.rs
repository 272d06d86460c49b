// src/flow/cvd.rs
// Cumulative volume delta: close-to-close delta sign times bar volume,
// summed. Approximates net buy/sell pressure without tick data.

use crate::candle::CandleData;
use crate::types::Trend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvdSignal {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub cvd: f64,
    pub trend: Trend,
    /// Price and CVD stepped in strictly opposite directions.
    pub divergence: bool,
    pub strength: f64,
}

/// Returns the per-bar running CVD plus one signal per step (bar 1 onward).
pub fn compute(candles: &[CandleData]) -> (Vec<f64>, Vec<CvdSignal>) {
    let n = candles.len();
    let mut cvd = Vec::with_capacity(n);
    let mut running = 0.0;
    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            let delta = candle.close - candles[i - 1].close;
            if delta > 0.0 {
                running += candle.volume;
            } else if delta < 0.0 {
                running -= candle.volume;
            }
        }
        cvd.push(running);
    }

    let max_step = (1..n)
        .map(|i| (cvd[i] - cvd[i - 1]).abs())
        .fold(0.0_f64, f64::max);

    let signals = (1..n)
        .map(|i| {
            let step = cvd[i] - cvd[i - 1];
            let trend = if step > 0.0 {
                Trend::Bullish
            } else if step < 0.0 {
                Trend::Bearish
            } else {
                Trend::Neutral
            };

            let price_step = candles[i].close - candles[i - 1].close;
            let divergence = (price_step > 0.0 && step < 0.0) || (price_step < 0.0 && step > 0.0);

            let strength = if max_step > 0.0 {
                (step.abs() / max_step * 100.0).min(100.0)
            } else {
                0.0
            };

            CvdSignal {
                bar_index: i,
                time: candles[i].time,
                cvd: cvd[i],
                trend,
                divergence,
                strength,
            }
        })
        .collect();

    (cvd, signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(i: usize, close: f64, volume: f64) -> CandleData {
        CandleData {
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        }
    }

    #[test]
    fn monotone_closes_give_monotone_cvd() {
        let candles: Vec<_> = (0..10).map(|i| candle(i, 100.0 + i as f64, 50.0)).collect();
        let (cvd, signals) = compute(&candles);
        assert!(cvd.windows(2).all(|w| w[1] >= w[0]));
        assert!(signals.iter().all(|s| s.trend == Trend::Bullish && !s.divergence));
    }

    #[test]
    fn flat_close_contributes_zero() {
        let candles = vec![candle(0, 100.0, 50.0), candle(1, 100.0, 80.0)];
        let (cvd, signals) = compute(&candles);
        assert_eq!(cvd, vec![0.0, 0.0]);
        assert_eq!(signals[0].trend, Trend::Neutral);
        assert_eq!(signals[0].strength, 0.0);
    }

    #[test]
    fn strength_is_relative_to_largest_step() {
        let candles = vec![
            candle(0, 100.0, 0.0),
            candle(1, 101.0, 50.0),
            candle(2, 102.0, 200.0),
        ];
        let (_, signals) = compute(&candles);
        assert_eq!(signals[0].strength, 25.0);
        assert_eq!(signals[1].strength, 100.0);
    }
}
