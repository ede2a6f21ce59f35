//! CSV file data adapter.
//!
//! Reads a header row and picks the `date` and `close` columns by name
//! (case-insensitive), so both plain `date,close` files and Yahoo-style
//! `Date,Open,High,Low,Close,Adj Close,Volume` exports load unchanged.

use crate::domain::error::MacrossError;
use crate::domain::price::{PricePoint, TimeSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, MacrossError> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| MacrossError::Data {
                reason: format!("missing {} column", name),
            })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, MacrossError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value.get(..10).unwrap_or(value), "%Y-%m-%d"))
        .map_err(|e| MacrossError::Data {
            reason: format!("invalid date '{}': {}", value, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<TimeSeries, MacrossError> {
        let content = fs::read_to_string(&self.path).map_err(|e| MacrossError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| MacrossError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let date_col = Self::column(headers, "date")?;
        let close_col = Self::column(headers, "close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| MacrossError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = parse_date(record.get(date_col).unwrap_or_default())?;
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let raw = record.get(close_col).unwrap_or_default().trim();
            if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
                warn!(%date, "skipping row without close price");
                continue;
            }
            let close: f64 = raw.parse().map_err(|e| MacrossError::Data {
                reason: format!("invalid close value '{}' on {}: {}", raw, date, e),
            })?;

            points.push(PricePoint::new(date, close));
        }

        points.sort_by_key(|p| p.date);
        debug!(path = %self.path.display(), points = points.len(), "loaded price series");
        TimeSeries::new(points)
    }
}
