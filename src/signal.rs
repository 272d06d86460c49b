// src/signal.rs
// Signal aggregation: blends the flow sentiment with the detected
// market-structure features into one directional bias, entry suggestions,
// key levels, and risk flags.

use crate::candle::CandleData;
use crate::flow::{FlowAnalytics, FlowSentiment};
use crate::types::{
    Bias, DetectedFeature, Direction, EntryDirection, EntrySignal, KeyLevels, LiquidityKind,
    Signal,
};
use log::debug;

pub struct SignalAggregator {
    pub level_proximity_pct: f64, // Key-level proximity band around the latest close
    pub fvg_min_strength: f64,    // Only gaps stronger than this influence bias
    pub bos_min_strength: f64,    // Only breaks stronger than this influence bias
    pub recent_run_bars: usize,   // Stop runs this close to the end are a risk flag
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self {
            level_proximity_pct: 0.002,
            fvg_min_strength: 30.0,
            bos_min_strength: 50.0,
            recent_run_bars: 5,
        }
    }
}

impl SignalAggregator {
    pub fn aggregate(
        &self,
        candles: &[CandleData],
        features: &[DetectedFeature],
        flow: &FlowAnalytics,
        sentiment: &FlowSentiment,
    ) -> Signal {
        let latest_price = candles.last().map_or(0.0, |c| c.close);
        let mut key_levels = KeyLevels::default();

        // Flow sentiment is the base; structure features adjust it.
        let base = match sentiment.sentiment {
            s if s.is_bullish() => sentiment.confidence,
            s if s.is_bearish() => -sentiment.confidence,
            _ => 0.0,
        };
        let mut score = base;

        let mut has_bullish_ob = false;
        let mut has_bearish_ob = false;
        let mut resistance_levels = Vec::new();
        let mut support_levels = Vec::new();
        let mut strong_fvgs = Vec::new();
        let mut bos_events = Vec::new();
        let mut stop_run_indices = Vec::new();

        for feature in features {
            match feature {
                DetectedFeature::OrderBlock(ob) => match ob.direction {
                    Direction::Bullish => has_bullish_ob = true,
                    Direction::Bearish => has_bearish_ob = true,
                },
                DetectedFeature::LiquidityZone(zone) => match zone.kind {
                    LiquidityKind::Resistance => resistance_levels.push(zone.price_level),
                    LiquidityKind::Support => support_levels.push(zone.price_level),
                    _ => {}
                },
                DetectedFeature::Fvg(gap) => {
                    if gap.strength > self.fvg_min_strength {
                        strong_fvgs.push(gap);
                    }
                }
                DetectedFeature::Bos(bos) => bos_events.push(bos),
                DetectedFeature::StopRun(run) => stop_run_indices.push(run.bar_index),
            }
        }

        if has_bullish_ob {
            score += 20.0;
        }
        if has_bearish_ob {
            score -= 20.0;
        }

        // Proximity to the last few confirmed liquidity levels.
        for &level in last_n(&resistance_levels, 3) {
            if (latest_price - level).abs() / latest_price < self.level_proximity_pct {
                key_levels.resistance.push(level);
                if latest_price < level {
                    score -= 10.0;
                }
            }
        }
        for &level in last_n(&support_levels, 3) {
            if (latest_price - level).abs() / latest_price < self.level_proximity_pct {
                key_levels.support.push(level);
                if latest_price > level {
                    score += 10.0;
                }
            }
        }

        for gap in last_n(&strong_fvgs, 3) {
            match gap.direction {
                Direction::Bullish if latest_price > gap.bottom => score += 15.0,
                Direction::Bearish if latest_price < gap.top => score -= 15.0,
                _ => {}
            }
        }

        for bos in last_n(&bos_events, 5) {
            if bos.strength > self.bos_min_strength {
                match bos.direction {
                    Direction::Bullish => score += 25.0,
                    Direction::Bearish => score -= 25.0,
                }
            }
        }

        let bias = Bias::from_score(score);
        let confidence = score.abs().min(100.0);
        let mut entry_signals = Vec::new();

        if bias.is_bullish() {
            if let Some(support) = nearest_level(&support_levels, latest_price) {
                if latest_price > support * 1.001 {
                    entry_signals.push(EntrySignal {
                        direction: EntryDirection::Buy,
                        reason: "Price above key support with bullish bias".to_string(),
                        entry_zone: (support * 0.999, support * 1.002),
                        confidence,
                    });
                }
            }
            if !resistance_levels.is_empty() {
                let mut targets = resistance_levels.clone();
                targets.sort_by(|a, b| a.total_cmp(b));
                targets.truncate(3);
                key_levels.targets = targets;
            }
        } else if bias.is_bearish() {
            if let Some(resistance) = nearest_level(&resistance_levels, latest_price) {
                if latest_price < resistance * 0.999 {
                    entry_signals.push(EntrySignal {
                        direction: EntryDirection::Sell,
                        reason: "Price below key resistance with bearish bias".to_string(),
                        entry_zone: (resistance * 0.998, resistance * 1.001),
                        confidence,
                    });
                }
            }
            if !support_levels.is_empty() {
                let mut targets = support_levels.clone();
                targets.sort_by(|a, b| b.total_cmp(a));
                targets.truncate(3);
                key_levels.targets = targets;
            }
        }

        let mut risk_factors = Vec::new();
        if strong_fvgs.len() > 3 {
            risk_factors.push("Multiple unfilled Fair Value Gaps present".to_string());
        }
        let recent_cutoff = candles.len().saturating_sub(self.recent_run_bars);
        if stop_run_indices.iter().any(|&i| i >= recent_cutoff) {
            risk_factors.push("Recent stop runs detected - high volatility expected".to_string());
        }
        if flow.cvd_summary.divergence_detected {
            risk_factors.push("CVD divergence detected - potential reversal".to_string());
        }

        debug!(
            "[Aggregator] score {:.1} -> {:?} (confidence {:.1}, {} entries, {} risks)",
            score,
            bias,
            confidence,
            entry_signals.len(),
            risk_factors.len()
        );

        Signal {
            bias,
            confidence,
            score,
            entry_signals,
            key_levels,
            risk_factors,
        }
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn nearest_level(levels: &[f64], price: f64) -> Option<f64> {
    levels
        .iter()
        .copied()
        .min_by(|a, b| (a - price).abs().total_cmp(&(b - price).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::types::{BosFeature, OrderBlockFeature};
    use chrono::{TimeZone, Utc};

    fn candle(i: usize, close: f64) -> CandleData {
        CandleData {
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            open: close - 0.2,
            high: close + 0.3,
            low: close - 0.3,
            close,
            volume: 100.0,
        }
    }

    fn flat_candles(n: usize) -> Vec<CandleData> {
        (0..n).map(|i| candle(i, 100.0)).collect()
    }

    fn neutral_flow(candles: &[CandleData]) -> FlowAnalytics {
        FlowAnalytics::compute(candles, &AnalyzerConfig::default())
    }

    fn order_block(direction: Direction) -> DetectedFeature {
        DetectedFeature::OrderBlock(OrderBlockFeature {
            bar_index: 4,
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 4, 0).unwrap(),
            direction,
            zone_high: 100.5,
            zone_low: 99.5,
            strength: 40.0,
            displacement_ratio: 0.01,
            volume_ratio: 2.0,
        })
    }

    fn bos(direction: Direction, strength: f64) -> DetectedFeature {
        DetectedFeature::Bos(BosFeature {
            bar_index: 20,
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 20, 0).unwrap(),
            direction,
            broken_level: 101.0,
            close: 102.0,
            strength,
            volume_ratio: 1.5,
        })
    }

    /// One bullish order block plus one bullish break at
    /// strength 60, neutral flow: score 45, bullish, confidence 45.
    #[test]
    fn bullish_block_and_break_score_45() {
        let candles = flat_candles(25);
        let flow = neutral_flow(&candles);
        let sentiment = flow.sentiment(&[]);
        assert_eq!(sentiment.score, 0.0);

        let features = vec![order_block(Direction::Bullish), bos(Direction::Bullish, 60.0)];
        let signal = SignalAggregator::default().aggregate(&candles, &features, &flow, &sentiment);

        assert_eq!(signal.score, 45.0);
        assert_eq!(signal.bias, Bias::Bullish);
        assert_eq!(signal.confidence, 45.0);
        assert!(signal.risk_factors.is_empty());
    }

    #[test]
    fn weak_break_does_not_count() {
        let candles = flat_candles(25);
        let flow = neutral_flow(&candles);
        let sentiment = flow.sentiment(&[]);

        let features = vec![bos(Direction::Bullish, 50.0)]; // not strictly above threshold
        let signal = SignalAggregator::default().aggregate(&candles, &features, &flow, &sentiment);

        assert_eq!(signal.score, 0.0);
        assert_eq!(signal.bias, Bias::Neutral);
        assert!(signal.entry_signals.is_empty());
    }

    #[test]
    fn opposing_blocks_cancel() {
        let candles = flat_candles(25);
        let flow = neutral_flow(&candles);
        let sentiment = flow.sentiment(&[]);

        let features = vec![order_block(Direction::Bullish), order_block(Direction::Bearish)];
        let signal = SignalAggregator::default().aggregate(&candles, &features, &flow, &sentiment);
        assert_eq!(signal.score, 0.0);
    }

    #[test]
    fn bullish_bias_emits_buy_above_support() {
        let candles = flat_candles(25);
        let flow = neutral_flow(&candles);
        let sentiment = flow.sentiment(&[]);

        let support = DetectedFeature::LiquidityZone(crate::types::LiquidityZoneFeature {
            bar_index: 10,
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 10, 0).unwrap(),
            kind: LiquidityKind::Support,
            price_level: 99.5,
            strength: 60.0,
            volume_ratio: Some(3.0),
            equal_level_count: None,
        });
        let features = vec![
            order_block(Direction::Bullish),
            bos(Direction::Bullish, 60.0),
            support,
        ];
        let signal = SignalAggregator::default().aggregate(&candles, &features, &flow, &sentiment);

        assert!(signal.bias.is_bullish());
        assert_eq!(signal.entry_signals.len(), 1);
        let entry = &signal.entry_signals[0];
        assert_eq!(entry.direction, EntryDirection::Buy);
        assert!((entry.entry_zone.0 - 99.5 * 0.999).abs() < 1e-9);
        assert!((entry.entry_zone.1 - 99.5 * 1.002).abs() < 1e-9);
    }
}
