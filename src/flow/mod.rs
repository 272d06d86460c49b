// src/flow/mod.rs
// Volume/flow analytics: CVD, VWAP, and volume dots over one candle
// series, their summaries, and the blended flow sentiment.

mod cvd;
mod volume_dots;
mod vwap;

pub use cvd::CvdSignal;
pub use volume_dots::{DotSignificance, DotType, VolumeDot};
pub use vwap::{VwapPosition, VwapSignal, VWAP_BAND};

use crate::candle::CandleData;
use crate::config::AnalyzerConfig;
use crate::types::{Bias, StopRunDirection, StopRunFeature, Trend};
use log::debug;
use serde::{Deserialize, Serialize};

/// Per-bar derived values, aligned index-for-index with the input candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPoint {
    pub cvd: f64,
    pub vwap: Option<f64>,
    /// Dot intensity for flagged bars, 0 otherwise.
    pub volume_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvdSummary {
    pub latest_trend: Trend,
    /// Any divergence within the last 5 steps.
    pub divergence_detected: bool,
    /// Mean signal strength over the last 10 steps.
    pub average_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VwapSummary {
    pub current_position: Option<VwapPosition>,
    pub current_trend: Trend,
    pub distance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDotSummary {
    pub high_volume_levels: Vec<f64>,
    pub accumulation_levels: Vec<f64>,
    pub distribution_levels: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSentiment {
    pub sentiment: Bias,
    pub score: f64,
    pub confidence: f64,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAnalytics {
    pub series: Vec<FlowPoint>,
    pub cvd_signals: Vec<CvdSignal>,
    pub vwap_signals: Vec<VwapSignal>,
    pub volume_dots: Vec<VolumeDot>,
    pub cvd_summary: CvdSummary,
    pub vwap_summary: VwapSummary,
    pub dot_summary: VolumeDotSummary,
}

impl FlowAnalytics {
    pub fn compute(candles: &[CandleData], config: &AnalyzerConfig) -> Self {
        let (cvd_series, cvd_signals) = cvd::compute(candles);
        let (vwap_series, vwap_signals) = vwap::compute(candles);
        let volume_dots = volume_dots::compute(
            candles,
            config.volume_dot_sigma_medium,
            config.volume_dot_sigma_high,
        );

        let mut series: Vec<FlowPoint> = cvd_series
            .into_iter()
            .zip(vwap_series)
            .map(|(cvd, vwap)| FlowPoint {
                cvd,
                vwap,
                volume_intensity: 0.0,
            })
            .collect();
        for dot in &volume_dots {
            series[dot.bar_index].volume_intensity = dot.intensity;
        }

        let cvd_summary = CvdSummary {
            latest_trend: cvd_signals.last().map_or(Trend::Neutral, |s| s.trend),
            divergence_detected: last_n(&cvd_signals, 5).iter().any(|s| s.divergence),
            average_strength: {
                let tail = last_n(&cvd_signals, 10);
                if tail.is_empty() {
                    0.0
                } else {
                    tail.iter().map(|s| s.strength).sum::<f64>() / tail.len() as f64
                }
            },
        };

        let vwap_summary = VwapSummary {
            current_position: vwap_signals.last().map(|s| s.position),
            current_trend: vwap_signals.last().map_or(Trend::Neutral, |s| s.trend),
            distance_pct: vwap_signals.last().map_or(0.0, |s| s.distance_pct),
        };

        let dot_summary = VolumeDotSummary {
            high_volume_levels: volume_dots
                .iter()
                .filter(|d| d.significance == DotSignificance::High)
                .map(|d| d.price_level)
                .collect(),
            accumulation_levels: volume_dots
                .iter()
                .filter(|d| d.dot_type == DotType::Accumulation)
                .map(|d| d.price_level)
                .collect(),
            distribution_levels: volume_dots
                .iter()
                .filter(|d| d.dot_type == DotType::Distribution)
                .map(|d| d.price_level)
                .collect(),
        };

        debug!(
            "[Flow] {} cvd signals, {} vwap signals, {} dots",
            cvd_signals.len(),
            vwap_signals.len(),
            volume_dots.len()
        );

        Self {
            series,
            cvd_signals,
            vwap_signals,
            volume_dots,
            cvd_summary,
            vwap_summary,
            dot_summary,
        }
    }

    /// Blends the flow indicators and the recent stop runs into one
    /// sentiment score. Each indicator contributes up to 25 points and a
    /// human-readable factor string.
    pub fn sentiment(&self, stop_runs: &[StopRunFeature]) -> FlowSentiment {
        let mut score = 0.0;
        let mut factors = Vec::new();

        if let Some(latest) = self.cvd_signals.last() {
            match latest.trend {
                Trend::Bullish => {
                    score += latest.strength / 100.0 * 25.0;
                    factors.push(format!("CVD bullish ({:.1}%)", latest.strength));
                }
                Trend::Bearish => {
                    score -= latest.strength / 100.0 * 25.0;
                    factors.push(format!("CVD bearish ({:.1}%)", latest.strength));
                }
                Trend::Neutral => {}
            }
        }

        if let Some(latest) = self.vwap_signals.last() {
            match latest.trend {
                Trend::Bullish => {
                    score += 25.0;
                    factors.push(format!("Price above VWAP ({:.2}%)", latest.distance_pct));
                }
                Trend::Bearish => {
                    score -= 25.0;
                    factors.push(format!("Price below VWAP ({:.2}%)", latest.distance_pct));
                }
                Trend::Neutral => {}
            }
        }

        let recent_dots = last_n(&self.volume_dots, 10);
        let accumulation = recent_dots
            .iter()
            .filter(|d| d.dot_type == DotType::Accumulation)
            .count();
        let distribution = recent_dots
            .iter()
            .filter(|d| d.dot_type == DotType::Distribution)
            .count();
        if accumulation > distribution {
            score += 25.0;
            factors.push("Volume accumulation detected".to_string());
        } else if distribution > accumulation {
            score -= 25.0;
            factors.push("Volume distribution detected".to_string());
        }

        let recent_runs = last_n(stop_runs, 5);
        let upward = recent_runs
            .iter()
            .filter(|r| r.direction == StopRunDirection::Upward)
            .count();
        let downward = recent_runs
            .iter()
            .filter(|r| r.direction == StopRunDirection::Downward)
            .count();
        if upward > downward {
            score += 25.0;
            factors.push("Upward liquidity grabs".to_string());
        } else if downward > upward {
            score -= 25.0;
            factors.push("Downward liquidity grabs".to_string());
        }

        FlowSentiment {
            sentiment: Bias::from_score(score),
            score,
            confidence: score.abs().min(100.0),
            factors,
        }
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
