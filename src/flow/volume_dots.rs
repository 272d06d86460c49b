// src/flow/volume_dots.rs
// Volume dots: bars trading one or two standard deviations above mean
// volume, classified by where the close landed in the bar's range.

use crate::candle::CandleData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DotSignificance {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DotType {
    Accumulation,
    Distribution,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDot {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    /// Typical price of the flagged bar.
    pub price_level: f64,
    pub intensity: f64,
    pub significance: DotSignificance,
    pub dot_type: DotType,
}

/// Flags high-volume bars over the whole window. A window with fewer than
/// two bars or zero volume dispersion yields no dots.
pub fn compute(candles: &[CandleData], sigma_medium: f64, sigma_high: f64) -> Vec<VolumeDot> {
    let n = candles.len();
    if n < 2 {
        return Vec::new();
    }

    let mean = candles.iter().map(|c| c.volume).sum::<f64>() / n as f64;
    let variance = candles
        .iter()
        .map(|c| (c.volume - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let std = variance.sqrt();
    if std <= 0.0 {
        return Vec::new();
    }

    let threshold_high = mean + sigma_high * std;
    let threshold_medium = mean + sigma_medium * std;

    candles
        .iter()
        .enumerate()
        .filter_map(|(i, candle)| {
            let deviations = (candle.volume - mean) / std;
            let (significance, intensity) = if candle.volume >= threshold_high {
                (DotSignificance::High, (deviations * 20.0).min(100.0))
            } else if candle.volume >= threshold_medium {
                (DotSignificance::Medium, (deviations * 15.0).min(100.0))
            } else {
                return None;
            };

            let range = candle.range();
            let close_position = if range > 0.0 {
                (candle.close - candle.low) / range
            } else {
                0.5
            };
            let dot_type = if close_position > 0.7 {
                DotType::Accumulation
            } else if close_position < 0.3 {
                DotType::Distribution
            } else {
                DotType::Neutral
            };

            Some(VolumeDot {
                bar_index: i,
                time: candle.time,
                price_level: candle.typical_price(),
                intensity,
                significance,
                dot_type,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(i: usize, high: f64, low: f64, close: f64, volume: f64) -> CandleData {
        CandleData {
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            open: (high + low) / 2.0,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn spike_bar_is_flagged_accumulation() {
        let mut candles: Vec<_> = (0..20).map(|i| candle(i, 101.0, 99.0, 100.0, 100.0)).collect();
        // Closes at the top decile of its range on a volume spike.
        candles[10] = candle(10, 101.0, 99.0, 100.9, 1000.0);

        let dots = compute(&candles, 1.0, 2.0);
        assert_eq!(dots.len(), 1);
        let dot = &dots[0];
        assert_eq!(dot.bar_index, 10);
        assert_eq!(dot.significance, DotSignificance::High);
        assert_eq!(dot.dot_type, DotType::Accumulation);
        assert!(dot.intensity > 0.0 && dot.intensity <= 100.0);
    }

    #[test]
    fn bottom_close_is_distribution() {
        let mut candles: Vec<_> = (0..20).map(|i| candle(i, 101.0, 99.0, 100.0, 100.0)).collect();
        candles[10] = candle(10, 101.0, 99.0, 99.1, 1000.0);

        let dots = compute(&candles, 1.0, 2.0);
        assert_eq!(dots[0].dot_type, DotType::Distribution);
    }

    #[test]
    fn uniform_volume_yields_no_dots() {
        let candles: Vec<_> = (0..20).map(|i| candle(i, 101.0, 99.0, 100.0, 100.0)).collect();
        assert!(compute(&candles, 1.0, 2.0).is_empty());
    }
}
