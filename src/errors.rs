// src/errors.rs

use thiserror::Error;

/// Errors surfaced by the analysis engine. Numeric-degenerate data (zero
/// volume averages, zero sigma, zero range) is handled by detector policy
/// and never raises.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("insufficient data for {context}: need {required} candles, got {actual}")]
    InsufficientData {
        required: usize,
        actual: usize,
        context: String,
    },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn insufficient(required: usize, actual: usize, context: &str) -> Self {
        AnalysisError::InsufficientData {
            required,
            actual,
            context: context.to_string(),
        }
    }
}
