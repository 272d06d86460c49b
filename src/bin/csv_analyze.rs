// src/bin/csv_analyze.rs
// Offline runner: load a candle CSV, run one analysis, print the report
// as JSON. Expected CSV header: time,open,high,low,close,volume with
// RFC-3339 timestamps.

use clap::Parser;
use log::info;
use smc_analyzer::{AnalysisRequest, Analyzer, AnalyzerConfig, CandleData};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "csv_analyze", about = "Run market-structure analysis over a candle CSV")]
struct Args {
    /// Candle CSV file
    csv_path: PathBuf,

    #[arg(long, default_value = "UNKNOWN")]
    symbol: String,

    #[arg(long, default_value = "1h")]
    timeframe: String,

    #[arg(long)]
    swing_window: Option<usize>,

    #[arg(long)]
    ob_lookback: Option<usize>,

    #[arg(long)]
    bos_lookback: Option<usize>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&args.csv_path)?;
    let mut candles: Vec<CandleData> = Vec::new();
    for row in reader.deserialize() {
        candles.push(row?);
    }
    info!(
        "Loaded {} candles from {}",
        candles.len(),
        args.csv_path.display()
    );

    let mut config = AnalyzerConfig::default();
    if let Some(w) = args.swing_window {
        config.swing_window = w;
    }
    if let Some(l) = args.ob_lookback {
        config.ob_lookback = l;
    }
    if let Some(l) = args.bos_lookback {
        config.bos_lookback = l;
    }

    let analyzer = Analyzer::new(config);
    let request = AnalysisRequest {
        symbol: args.symbol,
        timeframe: args.timeframe,
        candles,
    };
    let report = analyzer.analyze(&request)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
