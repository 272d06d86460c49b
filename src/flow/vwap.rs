// src/flow/vwap.rs
// Session VWAP over the analysis window, with a 0.1% band classifying the
// close as above/below/at.

use crate::candle::CandleData;
use crate::types::Trend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const VWAP_BAND: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VwapPosition {
    Above,
    Below,
    At,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VwapSignal {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub vwap: f64,
    pub position: VwapPosition,
    pub trend: Trend,
    pub distance_pct: f64,
}

/// Returns the per-bar VWAP (None until cumulative volume turns positive)
/// and one signal per bar with a defined VWAP.
pub fn compute(candles: &[CandleData]) -> (Vec<Option<f64>>, Vec<VwapSignal>) {
    let mut series = Vec::with_capacity(candles.len());
    let mut signals = Vec::new();
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        cum_pv += candle.typical_price() * candle.volume;
        cum_volume += candle.volume;

        if cum_volume <= 0.0 {
            series.push(None);
            continue;
        }
        let vwap = cum_pv / cum_volume;
        series.push(Some(vwap));

        let (position, trend) = if candle.close > vwap * (1.0 + VWAP_BAND) {
            (VwapPosition::Above, Trend::Bullish)
        } else if candle.close < vwap * (1.0 - VWAP_BAND) {
            (VwapPosition::Below, Trend::Bearish)
        } else {
            (VwapPosition::At, Trend::Neutral)
        };

        signals.push(VwapSignal {
            bar_index: i,
            time: candle.time,
            vwap,
            position,
            trend,
            distance_pct: (candle.close - vwap) / vwap * 100.0,
        });
    }

    (series, signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(i: usize, high: f64, low: f64, close: f64, volume: f64) -> CandleData {
        CandleData {
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn vwap_stays_inside_price_envelope() {
        let candles = vec![
            candle(0, 102.0, 98.0, 100.0, 50.0),
            candle(1, 106.0, 101.0, 105.0, 150.0),
            candle(2, 104.0, 99.0, 100.0, 80.0),
        ];
        let (series, _) = compute(&candles);
        let min_low = 98.0;
        let max_high = 106.0;
        for vwap in series.iter().flatten() {
            assert!(*vwap >= min_low && *vwap <= max_high);
        }
    }

    #[test]
    fn undefined_until_first_traded_volume() {
        let candles = vec![
            candle(0, 101.0, 99.0, 100.0, 0.0),
            candle(1, 101.0, 99.0, 100.0, 0.0),
            candle(2, 101.0, 99.0, 100.5, 60.0),
        ];
        let (series, signals) = compute(&candles);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert!(series[2].is_some());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].bar_index, 2);
    }

    #[test]
    fn close_well_above_vwap_is_bullish() {
        let candles = vec![
            candle(0, 101.0, 99.0, 100.0, 100.0),
            candle(1, 111.0, 100.0, 110.0, 100.0),
        ];
        let (_, signals) = compute(&candles);
        let last = signals.last().unwrap();
        assert_eq!(last.position, VwapPosition::Above);
        assert_eq!(last.trend, Trend::Bullish);
        assert!(last.distance_pct > 0.0);
    }
}
