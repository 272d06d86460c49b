// src/candle.rs
// OHLCV candle model and input validation shared by every detector.

use crate::errors::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleData {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl CandleData {
    /// Typical price used by VWAP and volume-dot levels.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Validates one analysis input series. Every detector assumes these hold,
/// so a single bad bar aborts the whole call with no partial results.
pub fn validate_candles(candles: &[CandleData]) -> Result<(), AnalysisError> {
    for (i, candle) in candles.iter().enumerate() {
        let fields = [candle.open, candle.high, candle.low, candle.close];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: "non-finite price field".to_string(),
            });
        }
        if !candle.volume.is_finite() || candle.volume < 0.0 {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: format!("invalid volume {}", candle.volume),
            });
        }
        if candle.low > candle.high {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: format!("low {} above high {}", candle.low, candle.high),
            });
        }
        if candle.open < candle.low
            || candle.open > candle.high
            || candle.close < candle.low
            || candle.close > candle.high
        {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: "open/close outside [low, high]".to_string(),
            });
        }
        if i > 0 && candle.time <= candles[i - 1].time {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: format!(
                    "timestamp {} not after previous bar {}",
                    candle.time,
                    candles[i - 1].time
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(minute: u32, open: f64, high: f64, low: f64, close: f64, volume: f64) -> CandleData {
        CandleData {
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn accepts_well_formed_series() {
        let candles = vec![
            candle(0, 1.0, 1.2, 0.9, 1.1, 100.0),
            candle(1, 1.1, 1.3, 1.0, 1.2, 150.0),
        ];
        assert!(validate_candles(&candles).is_ok());
    }

    #[test]
    fn rejects_low_above_high() {
        let candles = vec![candle(0, 1.0, 0.9, 1.2, 1.0, 100.0)];
        let err = validate_candles(&candles).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidBar { index: 0, .. }));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let candles = vec![
            candle(0, 1.0, 1.2, 0.9, 1.1, 100.0),
            candle(0, 1.1, 1.3, 1.0, 1.2, 150.0),
        ];
        let err = validate_candles(&candles).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidBar { index: 1, .. }));
    }

    #[test]
    fn rejects_close_outside_range() {
        let candles = vec![candle(0, 1.0, 1.2, 0.9, 1.4, 100.0)];
        assert!(validate_candles(&candles).is_err());
    }

    #[test]
    fn rejects_negative_volume() {
        let candles = vec![candle(0, 1.0, 1.2, 0.9, 1.1, -5.0)];
        assert!(validate_candles(&candles).is_err());
    }
}
