//! Single-instrument portfolio accounting from position-change events.
//!
//! Each event opens or closes a fixed-size position for the date it occurs
//! on: shares held on a date are `shares * position_delta`, not a running
//! total. Cash starts at `shares * first close` and moves by the cost of every
//! change in shares held. Fills are at the close with no costs.

use chrono::NaiveDate;

use super::error::MacrossError;
use super::price::TimeSeries;
use super::signal::{SignalRecord, check_alignment};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub shares: f64,
    pub holdings: f64,
    pub cash: f64,
    pub total: f64,
    /// Change in `total` from the previous date. `None` on the first date and
    /// whenever the previous total is zero.
    pub period_return: Option<f64>,
}

/// Replay `records` against `series` holding `shares` per signal event.
pub fn simulate(
    series: &TimeSeries,
    records: &[SignalRecord],
    shares: u32,
) -> Result<Vec<PortfolioState>, MacrossError> {
    if shares == 0 {
        return Err(MacrossError::InvalidParameter {
            reason: "share quantity must be positive".into(),
        });
    }
    series.require_non_empty()?;
    check_alignment(series, records)?;

    let quantity = shares as f64;
    let initial_cash = match series.first() {
        Some(first) => quantity * first.close,
        None => return Err(MacrossError::EmptySeries),
    };

    let mut states: Vec<PortfolioState> = Vec::with_capacity(series.len());
    let mut cash = initial_cash;
    let mut prev: Option<(f64, f64)> = None;

    for (point, record) in series.points().iter().zip(records) {
        let held = quantity * record.position_delta as f64;
        if let Some((prev_held, _)) = prev {
            cash -= (held - prev_held) * point.close;
        }
        let holdings = held * point.close;
        let total = cash + holdings;

        states.push(PortfolioState {
            date: point.date,
            shares: held,
            holdings,
            cash,
            total,
            period_return: prev.and_then(|(_, prev_total)| percent_change(prev_total, total)),
        });
        prev = Some((held, total));
    }

    Ok(states)
}

/// `curr / prev - 1`, undefined when `prev` is zero.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some(curr / prev - 1.0)
    }
}
