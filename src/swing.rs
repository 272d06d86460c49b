// src/swing.rs
// Centered rolling swing high/low location shared by the liquidity,
// structure-break, and stop-run detectors.

use crate::candle::CandleData;
use crate::errors::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub kind: SwingKind,
    pub price: f64,
    /// First index at which the full centered window is available, i.e. the
    /// earliest bar on which a causal consumer may act on this swing.
    pub confirmed_at: usize,
}

/// Precomputed centered rolling extrema over one candle series.
///
/// Window placement follows centered-rolling convention: for odd `w` the
/// window around `i` is `[i-(w-1)/2, i+(w-1)/2]`; for even `w` it is
/// `[i-w/2, i+w/2-1]`. `rolling_max`/`rolling_min` are `None` where the full
/// window does not fit.
#[derive(Debug, Clone)]
pub struct SwingSeries {
    pub window: usize,
    pub rolling_max: Vec<Option<f64>>,
    pub rolling_min: Vec<Option<f64>>,
    pub is_swing_high: Vec<bool>,
    pub is_swing_low: Vec<bool>,
}

impl SwingSeries {
    pub fn compute(candles: &[CandleData], window: usize) -> Result<Self, AnalysisError> {
        if window == 0 {
            return Err(AnalysisError::Config("swing window must be > 0".to_string()));
        }
        let n = candles.len();
        if n < window {
            return Err(AnalysisError::insufficient(window, n, "swing detection"));
        }

        let left = window / 2;
        let right = window - 1 - left;

        let mut rolling_max = vec![None; n];
        let mut rolling_min = vec![None; n];
        let mut is_swing_high = vec![false; n];
        let mut is_swing_low = vec![false; n];

        for i in left..(n - right) {
            let lo = i - left;
            let hi = i + right;
            let mut max = f64::NEG_INFINITY;
            let mut min = f64::INFINITY;
            for candle in &candles[lo..=hi] {
                max = max.max(candle.high);
                min = min.min(candle.low);
            }
            rolling_max[i] = Some(max);
            rolling_min[i] = Some(min);
            // Ties: every bar matching the window extreme counts as a swing.
            is_swing_high[i] = candles[i].high == max;
            is_swing_low[i] = candles[i].low == min;
        }

        Ok(Self {
            window,
            rolling_max,
            rolling_min,
            is_swing_high,
            is_swing_low,
        })
    }

    /// Look-ahead span of the centered window; a swing at `i` is knowable
    /// once bar `i + span` has closed.
    pub fn look_ahead(&self) -> usize {
        self.window - 1 - self.window / 2
    }

    pub fn swing_points(&self, candles: &[CandleData]) -> Vec<SwingPoint> {
        let span = self.look_ahead();
        let mut points = Vec::new();
        for i in 0..candles.len() {
            if self.is_swing_high[i] {
                points.push(SwingPoint {
                    index: i,
                    time: candles[i].time,
                    kind: SwingKind::High,
                    price: candles[i].high,
                    confirmed_at: i + span,
                });
            }
            if self.is_swing_low[i] {
                points.push(SwingPoint {
                    index: i,
                    time: candles[i].time,
                    kind: SwingKind::Low,
                    price: candles[i].low,
                    confirmed_at: i + span,
                });
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candles_from_highs_lows(highs: &[f64], lows: &[f64]) -> Vec<CandleData> {
        highs
            .iter()
            .zip(lows.iter())
            .enumerate()
            .map(|(i, (&high, &low))| CandleData {
                time: Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
                open: (high + low) / 2.0,
                high,
                low,
                close: (high + low) / 2.0,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn marks_center_extreme_in_odd_window() {
        let highs = [1.0, 2.0, 5.0, 2.0, 1.0, 1.5, 1.0];
        let lows = [0.5, 0.4, 0.3, 0.4, 0.5, 0.4, 0.5];
        let candles = candles_from_highs_lows(&highs, &lows);
        let swings = SwingSeries::compute(&candles, 5).unwrap();

        assert!(swings.is_swing_high[2]);
        assert!(!swings.is_swing_high[3]);
        assert!(swings.is_swing_low[2]);
        // Full window does not fit at the edges.
        assert!(swings.rolling_max[0].is_none());
        assert!(swings.rolling_max[1].is_some());
    }

    #[test]
    fn equal_extremes_are_all_marked() {
        let highs = [1.0, 3.0, 2.0, 3.0, 1.0, 0.9, 0.8];
        let lows = [0.5; 7];
        let candles = candles_from_highs_lows(&highs, &lows);
        let swings = SwingSeries::compute(&candles, 5).unwrap();

        assert!(swings.is_swing_high[1]);
        assert!(swings.is_swing_high[3]);
    }

    #[test]
    fn even_window_leans_left() {
        // w=4: window at i is [i-2, i+1], defined for 2 <= i <= n-2.
        let highs = [5.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let lows = [0.5; 6];
        let candles = candles_from_highs_lows(&highs, &lows);
        let swings = SwingSeries::compute(&candles, 4).unwrap();

        assert!(swings.rolling_max[1].is_none());
        assert_eq!(swings.rolling_max[2], Some(5.0));
        assert_eq!(swings.rolling_max[3], Some(1.0));
        assert_eq!(swings.look_ahead(), 1);
    }

    #[test]
    fn confirmed_at_trails_by_look_ahead() {
        let highs = [1.0, 2.0, 5.0, 2.0, 1.0, 1.5, 1.0];
        let lows = [0.5, 0.6, 0.7, 0.6, 0.5, 0.6, 0.5];
        let candles = candles_from_highs_lows(&highs, &lows);
        let swings = SwingSeries::compute(&candles, 5).unwrap();
        let points = swings.swing_points(&candles);

        let high_point = points
            .iter()
            .find(|p| p.kind == SwingKind::High && p.index == 2)
            .unwrap();
        assert_eq!(high_point.confirmed_at, 4);
    }

    #[test]
    fn too_few_candles_is_an_error() {
        let candles = candles_from_highs_lows(&[1.0, 2.0], &[0.5, 0.6]);
        let err = SwingSeries::compute(&candles, 5).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { required: 5, actual: 2, .. }));
    }
}
