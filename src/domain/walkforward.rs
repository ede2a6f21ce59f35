//! Walk-forward validation.
//!
//! The series is cut into `num_windows` equal, contiguous segments (any
//! remainder from the integer division is dropped). Segment `i` is searched
//! for the best pair, which is then scored unchanged on segment `i + 1`.
//! The aggregate is the mean out-of-sample performance.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use super::error::MacrossError;
use super::metrics::PerformanceMetrics;
use super::optimizer::{OptimizerSettings, grid_search};
use super::params::{ParameterGrid, ParameterPair};
use super::portfolio::simulate;
use super::price::TimeSeries;
use super::signal::{generate_signals, live_signal_dates};

pub const DEFAULT_NUM_WINDOWS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardConfig {
    pub num_windows: usize,
    pub grid: ParameterGrid,
    pub settings: OptimizerSettings,
}

/// First and last date of a segment plus its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: usize,
}

impl SegmentSpan {
    fn of(series: &TimeSeries) -> Result<Self, MacrossError> {
        match (series.first(), series.last()) {
            (Some(first), Some(last)) => Ok(SegmentSpan {
                start: first.date,
                end: last.date,
                points: series.len(),
            }),
            _ => Err(MacrossError::EmptySeries),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentResult {
    pub index: usize,
    pub in_sample: SegmentSpan,
    pub out_of_sample: SegmentSpan,
    pub pair: ParameterPair,
    pub in_sample_performance: f64,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardReport {
    pub window_size: usize,
    /// One entry per in-sample/out-of-sample step, in segment order.
    pub segments: Vec<SegmentResult>,
    /// Mean out-of-sample performance; `None` if any step is undefined.
    pub average_performance: Option<f64>,
    /// Best pair from the last in-sample segment.
    pub latest_pair: ParameterPair,
}

impl WalkForwardReport {
    /// Dates in `series` on which the latest pair's crossover signal is on.
    pub fn live_signals(&self, series: &TimeSeries) -> Result<Vec<NaiveDate>, MacrossError> {
        live_signal_dates(series, self.latest_pair)
    }
}

/// Equal, contiguous, non-overlapping segments; the remainder is dropped.
pub fn partition(series: &TimeSeries, num_windows: usize) -> Result<Vec<TimeSeries>, MacrossError> {
    if num_windows < 2 {
        return Err(MacrossError::InsufficientWindows {
            reason: format!("need at least 2 windows, got {num_windows}"),
        });
    }
    series.require_non_empty()?;
    let window_size = series.len() / num_windows;
    if window_size == 0 {
        return Err(MacrossError::InsufficientWindows {
            reason: format!(
                "{} points cannot fill {} windows",
                series.len(),
                num_windows
            ),
        });
    }
    Ok((0..num_windows)
        .map(|i| series.slice(i * window_size, (i + 1) * window_size))
        .collect())
}

pub fn walk_forward(
    series: &TimeSeries,
    config: &WalkForwardConfig,
) -> Result<WalkForwardReport, MacrossError> {
    let segments = partition(series, config.num_windows)?;
    if config.grid.pairs().is_empty() {
        return Err(MacrossError::EmptyGrid);
    }
    let window_size = segments[0].len();
    info!(
        windows = config.num_windows,
        window_size,
        dropped = series.len() - window_size * config.num_windows,
        "starting walk-forward validation"
    );

    let steps: Vec<SegmentResult> = (0..segments.len() - 1)
        .into_par_iter()
        .map(|i| run_step(i, &segments[i], &segments[i + 1], config))
        .collect::<Result<Vec<_>, MacrossError>>()?;

    let performances: Option<Vec<f64>> =
        steps.iter().map(|s| s.metrics.overall_performance).collect();
    let average_performance =
        performances.map(|p| p.iter().sum::<f64>() / p.len() as f64);

    let latest_pair = match steps.last() {
        Some(step) => step.pair,
        None => {
            return Err(MacrossError::InsufficientWindows {
                reason: "no out-of-sample steps".into(),
            });
        }
    };

    info!(?average_performance, %latest_pair, "walk-forward validation finished");
    Ok(WalkForwardReport {
        window_size,
        segments: steps,
        average_performance,
        latest_pair,
    })
}

/// Signals, simulation and metrics with no holding-period filter.
fn score_out_of_sample(
    series: &TimeSeries,
    pair: ParameterPair,
    shares: u32,
) -> Result<PerformanceMetrics, MacrossError> {
    let signals = generate_signals(series, pair)?;
    let states = simulate(series, &signals, shares)?;
    PerformanceMetrics::compute(&states, pair.long_window)
}

fn run_step(
    index: usize,
    in_sample: &TimeSeries,
    out_of_sample: &TimeSeries,
    config: &WalkForwardConfig,
) -> Result<SegmentResult, MacrossError> {
    let fit = grid_search(in_sample, &config.grid, &config.settings)?
        .ok_or(MacrossError::EmptyGrid)?;
    let metrics = score_out_of_sample(out_of_sample, fit.best, config.settings.shares)?;

    info!(
        segment = index,
        pair = %fit.best,
        in_sample = fit.best_performance,
        out_of_sample = ?metrics.overall_performance,
        "walk-forward step"
    );

    Ok(SegmentResult {
        index,
        in_sample: SegmentSpan::of(in_sample)?,
        out_of_sample: SegmentSpan::of(out_of_sample)?,
        pair: fit.best,
        in_sample_performance: fit.best_performance,
        metrics,
    })
}
