//! Moving-average crossover signals.

use chrono::NaiveDate;

use super::error::MacrossError;
use super::moving_average::expanding_sma;
use super::params::ParameterPair;
use super::price::TimeSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub date: NaiveDate,
    pub short_mavg: f64,
    pub long_mavg: f64,
    /// 1 while the short average is strictly above the long average, else 0.
    pub signal: i8,
    /// Day-over-day change in `signal`; 0 on the first date.
    pub position_delta: i8,
}

impl SignalRecord {
    pub fn is_entry(&self) -> bool {
        self.position_delta == 1
    }

    pub fn is_exit(&self) -> bool {
        self.position_delta == -1
    }
}

/// Crossover signal for every date of `series`.
pub fn generate_signals(
    series: &TimeSeries,
    pair: ParameterPair,
) -> Result<Vec<SignalRecord>, MacrossError> {
    pair.validate()?;
    series.require_non_empty()?;

    let closes: Vec<f64> = series.closes().collect();
    let short = expanding_sma(&closes, pair.short_window);
    let long = expanding_sma(&closes, pair.long_window);

    let mut records = Vec::with_capacity(series.len());
    let mut prev_signal: Option<i8> = None;

    for (i, point) in series.points().iter().enumerate() {
        let signal = if short[i] > long[i] { 1 } else { 0 };
        let position_delta = prev_signal.map_or(0, |prev| signal - prev);
        prev_signal = Some(signal);

        records.push(SignalRecord {
            date: point.date,
            short_mavg: short[i],
            long_mavg: long[i],
            signal,
            position_delta,
        });
    }

    Ok(records)
}

/// Buy-side deltas minus sell-side deltas, date by date.
///
/// A sell crossover turning on (+1) becomes an exit (-1) in the combined
/// sequence. Values may reach -2 or +2 when both sides move on the same date.
pub fn combine_buy_sell(
    buy: &[SignalRecord],
    sell: &[SignalRecord],
) -> Result<Vec<SignalRecord>, MacrossError> {
    if buy.len() != sell.len() {
        return Err(MacrossError::InvalidParameter {
            reason: format!(
                "buy and sell signals differ in length ({} vs {})",
                buy.len(),
                sell.len()
            ),
        });
    }
    buy.iter()
        .zip(sell)
        .map(|(b, s)| {
            if b.date != s.date {
                return Err(MacrossError::Misaligned {
                    expected: b.date,
                    found: s.date,
                });
            }
            Ok(SignalRecord {
                position_delta: b.position_delta - s.position_delta,
                ..b.clone()
            })
        })
        .collect()
}

/// Dates on which the crossover signal is on, i.e. the strategy is long.
pub fn live_signal_dates(
    series: &TimeSeries,
    pair: ParameterPair,
) -> Result<Vec<NaiveDate>, MacrossError> {
    Ok(generate_signals(series, pair)?
        .into_iter()
        .filter(|r| r.signal == 1)
        .map(|r| r.date)
        .collect())
}

/// Check that `records` carry exactly the dates of `series`, in order.
pub(crate) fn check_alignment(
    series: &TimeSeries,
    records: &[SignalRecord],
) -> Result<(), MacrossError> {
    if records.len() != series.len() {
        return Err(MacrossError::InvalidParameter {
            reason: format!(
                "{} signal records for a series of {} prices",
                records.len(),
                series.len()
            ),
        });
    }
    for (point, record) in series.points().iter().zip(records) {
        if point.date != record.date {
            return Err(MacrossError::Misaligned {
                expected: point.date,
                found: record.date,
            });
        }
    }
    Ok(())
}
