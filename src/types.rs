// src/types.rs
// Output model: detected features, directional bias enums, and the
// aggregated trading signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ==================== DIRECTION / BIAS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
}

/// Three-way trend used by the flow series (CVD/VWAP step direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Five-way overall bias produced by the aggregator and flow sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    StronglyBullish,
    Bullish,
    Neutral,
    Bearish,
    StronglyBearish,
}

impl Bias {
    pub fn from_score(score: f64) -> Self {
        if score > 50.0 {
            Bias::StronglyBullish
        } else if score > 25.0 {
            Bias::Bullish
        } else if score > -25.0 {
            Bias::Neutral
        } else if score > -50.0 {
            Bias::Bearish
        } else {
            Bias::StronglyBearish
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Bias::Bullish | Bias::StronglyBullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Bias::Bearish | Bias::StronglyBearish)
    }
}

// ==================== DETECTED FEATURES ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlockFeature {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub direction: Direction,
    pub zone_high: f64,
    pub zone_low: f64,
    pub strength: f64,
    pub displacement_ratio: f64,
    pub volume_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityKind {
    Resistance,
    Support,
    EqualHighs,
    EqualLows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityZoneFeature {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub kind: LiquidityKind,
    pub price_level: f64,
    pub strength: f64,
    /// Swing volume over surrounding mean for the volume-confirmed rules,
    /// matched-level count for the equal-high/low rules.
    pub volume_ratio: Option<f64>,
    pub equal_level_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FvgFeature {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub direction: Direction,
    pub top: f64,
    pub bottom: f64,
    pub strength: f64,
    pub gap_size_ratio: f64,
    pub volume_surge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BosFeature {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub direction: Direction,
    /// Swing extreme the close broke through.
    pub broken_level: f64,
    pub close: f64,
    pub strength: f64,
    pub volume_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRunDirection {
    Upward,
    Downward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRunFeature {
    pub bar_index: usize,
    pub time: DateTime<Utc>,
    pub direction: StopRunDirection,
    /// Wick extreme that performed the grab (bar high for upward runs).
    pub price_level: f64,
    /// Swing level that was pierced and rejected.
    pub swept_level: f64,
    pub liquidity_grabbed: f64,
    pub probability: f64,
    pub next_target: Option<f64>,
}

/// One detected market-structure feature. Serialized with a `kind` tag so
/// downstream consumers can store heterogeneous rows in one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectedFeature {
    OrderBlock(OrderBlockFeature),
    LiquidityZone(LiquidityZoneFeature),
    Fvg(FvgFeature),
    Bos(BosFeature),
    StopRun(StopRunFeature),
}

impl DetectedFeature {
    pub fn bar_index(&self) -> usize {
        match self {
            DetectedFeature::OrderBlock(f) => f.bar_index,
            DetectedFeature::LiquidityZone(f) => f.bar_index,
            DetectedFeature::Fvg(f) => f.bar_index,
            DetectedFeature::Bos(f) => f.bar_index,
            DetectedFeature::StopRun(f) => f.bar_index,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        match self {
            DetectedFeature::OrderBlock(f) => f.time,
            DetectedFeature::LiquidityZone(f) => f.time,
            DetectedFeature::Fvg(f) => f.time,
            DetectedFeature::Bos(f) => f.time,
            DetectedFeature::StopRun(f) => f.time,
        }
    }

    pub fn strength(&self) -> f64 {
        match self {
            DetectedFeature::OrderBlock(f) => f.strength,
            DetectedFeature::LiquidityZone(f) => f.strength,
            DetectedFeature::Fvg(f) => f.strength,
            DetectedFeature::Bos(f) => f.strength,
            DetectedFeature::StopRun(f) => f.probability,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DetectedFeature::OrderBlock(f) => match f.direction {
                Direction::Bullish => "bullish_order_block",
                Direction::Bearish => "bearish_order_block",
            },
            DetectedFeature::LiquidityZone(f) => match f.kind {
                LiquidityKind::Resistance => "liquidity_resistance",
                LiquidityKind::Support => "liquidity_support",
                LiquidityKind::EqualHighs => "equal_highs",
                LiquidityKind::EqualLows => "equal_lows",
            },
            DetectedFeature::Fvg(f) => match f.direction {
                Direction::Bullish => "bullish_fvg",
                Direction::Bearish => "bearish_fvg",
            },
            DetectedFeature::Bos(f) => match f.direction {
                Direction::Bullish => "bullish_bos",
                Direction::Bearish => "bearish_bos",
            },
            DetectedFeature::StopRun(f) => match f.direction {
                StopRunDirection::Upward => "upward_stop_run",
                StopRunDirection::Downward => "downward_stop_run",
            },
        }
    }

    fn price_bounds(&self) -> (f64, f64) {
        match self {
            DetectedFeature::OrderBlock(f) => (f.zone_high, f.zone_low),
            DetectedFeature::LiquidityZone(f) => (f.price_level, f.price_level),
            DetectedFeature::Fvg(f) => (f.top, f.bottom),
            DetectedFeature::Bos(f) => (f.broken_level, f.close),
            DetectedFeature::StopRun(f) => (f.price_level, f.swept_level),
        }
    }

    /// Deterministic 16-hex-char ID so a persistence layer can upsert the
    /// same feature across repeated analyses without duplicates. Same
    /// inputs, same ID, across processes.
    pub fn deterministic_id(&self, symbol: &str, timeframe: &str) -> String {
        const PRECISION: usize = 8;
        let clean_symbol = symbol.replace("_SB", "");
        let clean_timeframe = timeframe.to_lowercase();
        let (high, low) = self.price_bounds();
        let fmt_price = |v: f64| {
            if v.is_finite() {
                format!("{:.prec$}", v, prec = PRECISION)
            } else {
                "0.0".to_string()
            }
        };

        let id_input = format!(
            "{}_{}_{}_{}_{}_{}",
            clean_symbol,
            clean_timeframe,
            self.label(),
            self.time().to_rfc3339(),
            fmt_price(high),
            fmt_price(low),
        );

        let mut hasher = Sha256::new();
        hasher.update(id_input.as_bytes());
        let hex_id = format!("{:x}", hasher.finalize());
        hex_id[..16].to_string()
    }
}

// ==================== AGGREGATED SIGNAL ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub direction: EntryDirection,
    pub reason: String,
    pub entry_zone: (f64, f64),
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    pub targets: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub bias: Bias,
    pub confidence: f64,
    pub score: f64,
    pub entry_signals: Vec<EntrySignal>,
    pub key_levels: KeyLevels,
    pub risk_factors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_feature() -> DetectedFeature {
        DetectedFeature::Fvg(FvgFeature {
            bar_index: 7,
            time: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            direction: Direction::Bullish,
            top: 100.0,
            bottom: 95.0,
            strength: 52.6,
            gap_size_ratio: 0.0526,
            volume_surge: false,
        })
    }

    #[test]
    fn bias_score_mapping_boundaries() {
        assert_eq!(Bias::from_score(51.0), Bias::StronglyBullish);
        assert_eq!(Bias::from_score(50.0), Bias::Bullish);
        assert_eq!(Bias::from_score(25.0), Bias::Neutral);
        assert_eq!(Bias::from_score(-25.0), Bias::Bearish);
        assert_eq!(Bias::from_score(-50.0), Bias::StronglyBearish);
    }

    #[test]
    fn deterministic_id_is_stable_and_normalized() {
        let feature = sample_feature();
        let id = feature.deterministic_id("EURUSD_SB", "30M");
        assert_eq!(id.len(), 16);
        // Suffix stripping and timeframe case must not change the ID.
        assert_eq!(id, feature.deterministic_id("EURUSD", "30m"));
    }

    #[test]
    fn feature_serializes_with_kind_tag() {
        let value = serde_json::to_value(sample_feature()).unwrap();
        assert_eq!(value["kind"], "fvg");
        assert_eq!(value["direction"], "bullish");
        assert_eq!(value["top"], 100.0);
    }
}
