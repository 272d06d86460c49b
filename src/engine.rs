// src/engine.rs
// Analysis engine: validates one candle series, fans out to the detectors
// and flow analytics, and aggregates everything into a report.

use crate::candle::{validate_candles, CandleData};
use crate::config::AnalyzerConfig;
use crate::detectors::{
    BreakOfStructureDetector, FairValueGapDetector, LiquidityZoneDetector, OrderBlockDetector,
    StopRunDetector,
};
use crate::errors::AnalysisError;
use crate::flow::{FlowAnalytics, FlowSentiment};
use crate::signal::SignalAggregator;
use crate::types::{
    DetectedFeature, Direction, FvgFeature, LiquidityKind, OrderBlockFeature, Signal,
    StopRunDirection, StopRunFeature,
};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub timeframe: String,
    pub candles: Vec<CandleData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBlockSummary {
    pub bullish: Vec<OrderBlockFeature>,
    pub bearish: Vec<OrderBlockFeature>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySummary {
    pub resistance_levels: Vec<f64>,
    pub support_levels: Vec<f64>,
    pub equal_highs: Vec<f64>,
    pub equal_lows: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FvgSummary {
    pub bullish: Vec<FvgFeature>,
    pub bearish: Vec<FvgFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BosSummary {
    pub bullish_count: usize,
    pub bearish_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRunSummary {
    /// Last five detected runs, oldest first.
    pub recent: Vec<StopRunFeature>,
    pub upward_targets: Vec<f64>,
    pub downward_targets: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub timeframe: String,
    pub candles_analyzed: usize,
    /// Last bar index whose order-block status is decidable; later bars
    /// lack the forward confirmation window and are never labeled.
    pub confirmed_through: Option<usize>,
    pub features: Vec<DetectedFeature>,
    pub order_blocks: OrderBlockSummary,
    pub liquidity: LiquiditySummary,
    pub fair_value_gaps: FvgSummary,
    pub structure_breaks: BosSummary,
    pub stop_runs: StopRunSummary,
    pub flow: FlowAnalytics,
    pub sentiment: FlowSentiment,
    pub signal: Signal,
}

/// Pure, stateless analyzer: every call works over the supplied candles
/// only, so concurrent calls need no coordination.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        self.config.validate()?;
        let candles = &request.candles;
        validate_candles(candles)?;

        let required = self.config.min_candles();
        if candles.len() < required {
            return Err(AnalysisError::insufficient(
                required,
                candles.len(),
                "market structure analysis",
            ));
        }

        debug!(
            "[Engine] Analyzing {}/{} with {} candles",
            request.symbol,
            request.timeframe,
            candles.len()
        );

        let ob_scan = OrderBlockDetector {
            lookback: self.config.ob_lookback,
            ..Default::default()
        }
        .detect(candles)?;

        let liquidity_features = LiquidityZoneDetector {
            swing_window: self.config.swing_window,
            tolerance_pct: self.config.liquidity_tolerance_pct,
            ..Default::default()
        }
        .detect(candles)?;

        let fvg_features = FairValueGapDetector {
            volume_multiplier: self.config.fvg_volume_multiplier,
            ..Default::default()
        }
        .detect(candles)?;

        let bos_features = BreakOfStructureDetector {
            lookback: self.config.bos_lookback,
            ..Default::default()
        }
        .detect(candles)?;

        let stop_run_features = StopRunDetector {
            swing_window: self.config.swing_window,
            ..Default::default()
        }
        .detect(candles)?;

        let mut features = ob_scan.features;
        features.extend(liquidity_features);
        features.extend(fvg_features);
        features.extend(bos_features);
        features.extend(stop_run_features);
        features.sort_by_key(|f| f.bar_index());

        let flow = FlowAnalytics::compute(candles, &self.config);

        let stop_runs: Vec<StopRunFeature> = features
            .iter()
            .filter_map(|f| match f {
                DetectedFeature::StopRun(run) => Some(run.clone()),
                _ => None,
            })
            .collect();
        let sentiment = flow.sentiment(&stop_runs);

        let signal =
            SignalAggregator::default().aggregate(candles, &features, &flow, &sentiment);

        let report = AnalysisReport {
            symbol: request.symbol.clone(),
            timeframe: request.timeframe.clone(),
            candles_analyzed: candles.len(),
            confirmed_through: ob_scan.confirmed_through,
            order_blocks: summarize_order_blocks(&features),
            liquidity: summarize_liquidity(&features),
            fair_value_gaps: summarize_fvgs(&features),
            structure_breaks: summarize_bos(&features),
            stop_runs: summarize_stop_runs(&stop_runs),
            features,
            flow,
            sentiment,
            signal,
        };

        debug!(
            "[Engine] {}/{}: {} features, bias {:?}",
            request.symbol,
            request.timeframe,
            report.features.len(),
            report.signal.bias
        );
        Ok(report)
    }
}

fn summarize_order_blocks(features: &[DetectedFeature]) -> OrderBlockSummary {
    let mut summary = OrderBlockSummary::default();
    for feature in features {
        if let DetectedFeature::OrderBlock(ob) = feature {
            summary.count += 1;
            match ob.direction {
                Direction::Bullish => summary.bullish.push(ob.clone()),
                Direction::Bearish => summary.bearish.push(ob.clone()),
            }
        }
    }
    summary
}

fn summarize_liquidity(features: &[DetectedFeature]) -> LiquiditySummary {
    let mut summary = LiquiditySummary::default();
    for feature in features {
        if let DetectedFeature::LiquidityZone(zone) = feature {
            match zone.kind {
                LiquidityKind::Resistance => summary.resistance_levels.push(zone.price_level),
                LiquidityKind::Support => summary.support_levels.push(zone.price_level),
                LiquidityKind::EqualHighs => summary.equal_highs.push(zone.price_level),
                LiquidityKind::EqualLows => summary.equal_lows.push(zone.price_level),
            }
        }
    }
    summary
}

fn summarize_fvgs(features: &[DetectedFeature]) -> FvgSummary {
    let mut summary = FvgSummary::default();
    for feature in features {
        if let DetectedFeature::Fvg(gap) = feature {
            match gap.direction {
                Direction::Bullish => summary.bullish.push(gap.clone()),
                Direction::Bearish => summary.bearish.push(gap.clone()),
            }
        }
    }
    summary
}

fn summarize_bos(features: &[DetectedFeature]) -> BosSummary {
    let mut summary = BosSummary::default();
    for feature in features {
        if let DetectedFeature::Bos(bos) = feature {
            match bos.direction {
                Direction::Bullish => summary.bullish_count += 1,
                Direction::Bearish => summary.bearish_count += 1,
            }
        }
    }
    summary
}

fn summarize_stop_runs(stop_runs: &[StopRunFeature]) -> StopRunSummary {
    let recent = stop_runs[stop_runs.len().saturating_sub(5)..].to_vec();
    StopRunSummary {
        upward_targets: stop_runs
            .iter()
            .filter(|r| r.direction == StopRunDirection::Upward)
            .filter_map(|r| r.next_target)
            .collect(),
        downward_targets: stop_runs
            .iter()
            .filter(|r| r.direction == StopRunDirection::Downward)
            .filter_map(|r| r.next_target)
            .collect(),
        recent,
    }
}
