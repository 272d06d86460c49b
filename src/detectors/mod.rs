// src/detectors/mod.rs

mod break_of_structure;
mod fair_value_gap;
mod liquidity_zone;
mod order_block;
mod stop_run;

pub use break_of_structure::BreakOfStructureDetector;
pub use fair_value_gap::FairValueGapDetector;
pub use liquidity_zone::LiquidityZoneDetector;
pub use order_block::{OrderBlockDetector, OrderBlockScan};
pub use stop_run::StopRunDetector;
