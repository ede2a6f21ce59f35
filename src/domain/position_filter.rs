//! Holding-period filter for exit events.
//!
//! An exit (`position_delta == -1`) is honoured only when the most recent
//! earlier entry (`position_delta == +1`) lies exactly one of the allowed
//! holding periods before it. Every other exit is cancelled (delta set to 0).
//! Entries and all other delta values pass through untouched.

use chrono::NaiveDate;

use super::error::MacrossError;
use super::price::TimeSeries;
use super::signal::{SignalRecord, check_alignment};

pub const DEFAULT_HOLDING_DAYS: [i64; 3] = [5, 15, 30];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingPeriodFilter {
    allowed_days: Vec<i64>,
}

impl Default for HoldingPeriodFilter {
    fn default() -> Self {
        HoldingPeriodFilter {
            allowed_days: DEFAULT_HOLDING_DAYS.to_vec(),
        }
    }
}

impl HoldingPeriodFilter {
    pub fn new(allowed_days: Vec<i64>) -> Result<Self, MacrossError> {
        if allowed_days.is_empty() {
            return Err(MacrossError::InvalidParameter {
                reason: "holding filter needs at least one holding period".into(),
            });
        }
        if let Some(&bad) = allowed_days.iter().find(|&&d| d <= 0) {
            return Err(MacrossError::InvalidParameter {
                reason: format!("holding period {bad} must be positive"),
            });
        }
        Ok(HoldingPeriodFilter { allowed_days })
    }

    pub fn allowed_days(&self) -> &[i64] {
        &self.allowed_days
    }

    /// Revised copy of `records` with disallowed exits cancelled.
    ///
    /// Each exit is judged against the latest entry strictly before it, so
    /// several exits after a single entry are each measured from that entry.
    pub fn apply(
        &self,
        series: &TimeSeries,
        records: &[SignalRecord],
    ) -> Result<Vec<SignalRecord>, MacrossError> {
        series.require_non_empty()?;
        check_alignment(series, records)?;

        let mut revised = records.to_vec();
        let mut last_entry: Option<NaiveDate> = None;

        for record in revised.iter_mut() {
            if record.position_delta == -1 {
                let keep = match last_entry {
                    Some(entry_date) => {
                        let held = (record.date - entry_date).num_days();
                        self.allowed_days.contains(&held)
                    }
                    None => false,
                };
                if !keep {
                    record.position_delta = 0;
                }
            } else if record.position_delta == 1 {
                last_entry = Some(record.date);
            }
        }

        Ok(revised)
    }
}
