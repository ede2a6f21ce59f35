//! Core domain types and the strategy-evaluation pipeline.

pub mod price;
pub mod params;
pub mod moving_average;
pub mod signal;
pub mod position_filter;
pub mod portfolio;
pub mod metrics;
pub mod optimizer;
pub mod walkforward;
pub mod config_validation;
pub mod error;
