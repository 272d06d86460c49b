// src/lib.rs

pub mod candle;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod errors;
pub mod flow;
pub mod signal;
pub mod swing;
pub mod types;

pub use candle::CandleData;
pub use config::AnalyzerConfig;
pub use engine::{AnalysisReport, AnalysisRequest, Analyzer};
pub use errors::AnalysisError;
pub use types::{Bias, DetectedFeature, Signal};
