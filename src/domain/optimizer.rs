//! Exhaustive grid search over moving-average window pairs.
//!
//! Pairs are evaluated in parallel and collected in canonical order
//! (ascending short, then ascending long). The best pair is picked by a
//! sequential pass over that ordered table that only replaces the incumbent
//! on a strictly greater performance, so ties go to the earliest pair no
//! matter which evaluation finished first.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::error::MacrossError;
use super::metrics::PerformanceMetrics;
use super::params::{ParameterGrid, ParameterPair};
use super::portfolio::simulate;
use super::position_filter::HoldingPeriodFilter;
use super::price::TimeSeries;
use super::signal::{SignalRecord, combine_buy_sell, generate_signals};

pub const DEFAULT_SHARES: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub shares: u32,
    /// Holding-period filter applied to exits before simulation, if any.
    pub filter: Option<HoldingPeriodFilter>,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            shares: DEFAULT_SHARES,
            filter: None,
        }
    }
}

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridResult {
    pub short_window: usize,
    pub long_window: usize,
    pub overall_performance: Option<f64>,
}

impl GridResult {
    pub fn pair(&self) -> ParameterPair {
        ParameterPair {
            short_window: self.short_window,
            long_window: self.long_window,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub best: ParameterPair,
    pub best_performance: f64,
    /// Every evaluated pair, in canonical order.
    pub results: Vec<GridResult>,
}

/// Run one pair through signals, the optional filter, simulation and metrics.
pub fn evaluate_pair(
    series: &TimeSeries,
    pair: ParameterPair,
    settings: &OptimizerSettings,
) -> Result<PerformanceMetrics, MacrossError> {
    let signals = generate_signals(series, pair)?;
    score(series, signals, settings.filter.as_ref(), settings.shares, pair.long_window)
}

fn score(
    series: &TimeSeries,
    signals: Vec<SignalRecord>,
    filter: Option<&HoldingPeriodFilter>,
    shares: u32,
    long_window: usize,
) -> Result<PerformanceMetrics, MacrossError> {
    let signals = match filter {
        Some(filter) => filter.apply(series, &signals)?,
        None => signals,
    };
    let states = simulate(series, &signals, shares)?;
    PerformanceMetrics::compute(&states, long_window)
}

/// Best pair over `grid`, or `None` when the grid holds no valid pair.
pub fn grid_search(
    series: &TimeSeries,
    grid: &ParameterGrid,
    settings: &OptimizerSettings,
) -> Result<Option<OptimizationResult>, MacrossError> {
    search(series, grid, settings, None)
}

/// As [`grid_search`], checking `cancel` before each pair evaluation.
pub fn grid_search_cancellable(
    series: &TimeSeries,
    grid: &ParameterGrid,
    settings: &OptimizerSettings,
    cancel: &AtomicBool,
) -> Result<Option<OptimizationResult>, MacrossError> {
    search(series, grid, settings, Some(cancel))
}

fn search(
    series: &TimeSeries,
    grid: &ParameterGrid,
    settings: &OptimizerSettings,
    cancel: Option<&AtomicBool>,
) -> Result<Option<OptimizationResult>, MacrossError> {
    series.require_non_empty()?;
    let pairs = grid.pairs();
    info!(pairs = pairs.len(), points = series.len(), "starting grid search");

    let results = evaluate_all(&pairs, cancel, |pair| evaluate_pair(series, pair, settings))?;
    Ok(finish(results))
}

/// Sweep sell-side pairs against a fixed buy pair.
///
/// For every sell pair the combined delta is `buy - sell`, so a sell-side
/// crossover turning on becomes an exit. The holding-period filter (the
/// configured one, or the default 5/15/30-day rule) is then applied before
/// simulation. The table lists the sell pairs.
pub fn grid_search_sell_side(
    series: &TimeSeries,
    buy: ParameterPair,
    sell_grid: &ParameterGrid,
    settings: &OptimizerSettings,
) -> Result<Option<OptimizationResult>, MacrossError> {
    series.require_non_empty()?;
    let buy_signals = generate_signals(series, buy)?;
    let filter = settings.filter.clone().unwrap_or_default();
    let pairs = sell_grid.pairs();
    info!(%buy, pairs = pairs.len(), "starting sell-side grid search");

    let results = evaluate_all(&pairs, None, |sell| {
        let sell_signals = generate_signals(series, sell)?;
        let combined = combine_buy_sell(&buy_signals, &sell_signals)?;
        score(series, combined, Some(&filter), settings.shares, sell.long_window)
    })?;
    Ok(finish(results))
}

fn evaluate_all<F>(
    pairs: &[ParameterPair],
    cancel: Option<&AtomicBool>,
    eval: F,
) -> Result<Vec<GridResult>, MacrossError>
where
    F: Fn(ParameterPair) -> Result<PerformanceMetrics, MacrossError> + Sync,
{
    let outcomes: Vec<Option<Result<GridResult, MacrossError>>> = pairs
        .par_iter()
        .map(|&pair| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return None;
            }
            let outcome = eval(pair).map(|metrics| GridResult {
                short_window: pair.short_window,
                long_window: pair.long_window,
                overall_performance: metrics.overall_performance,
            });
            if let Ok(row) = &outcome {
                debug!(%pair, performance = ?row.overall_performance, "evaluated pair");
            }
            Some(outcome)
        })
        .collect();

    let total = outcomes.len();
    let mut results = Vec::with_capacity(total);
    let mut skipped = false;
    for outcome in outcomes {
        match outcome {
            Some(row) => results.push(row?),
            None => skipped = true,
        }
    }
    if skipped {
        return Err(MacrossError::Cancelled {
            evaluated: results.len(),
            total,
        });
    }
    Ok(results)
}

fn finish(results: Vec<GridResult>) -> Option<OptimizationResult> {
    let (best, best_performance) = select_best(&results)?;
    info!(%best, best_performance, "grid search finished");
    Some(OptimizationResult {
        best,
        best_performance,
        results,
    })
}

/// First row with the highest defined performance.
pub fn select_best(results: &[GridResult]) -> Option<(ParameterPair, f64)> {
    let mut best: Option<(ParameterPair, f64)> = None;
    for row in results {
        let Some(performance) = row.overall_performance.filter(|p| !p.is_nan()) else {
            continue;
        };
        if best.is_none_or(|(_, incumbent)| performance > incumbent) {
            best = Some((row.pair(), performance));
        }
    }
    best
}
