#![allow(dead_code)]

use chrono::NaiveDate;
use macross::domain::error::MacrossError;
use macross::domain::price::{PricePoint, TimeSeries};
use macross::ports::data_port::DataPort;

pub struct MockDataPort {
    pub points: Vec<PricePoint>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self {
            points,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            points: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<TimeSeries, MacrossError> {
        if let Some(reason) = &self.error {
            return Err(MacrossError::Data {
                reason: reason.clone(),
            });
        }
        TimeSeries::new(
            self.points
                .iter()
                .filter(|p| start_date.is_none_or(|s| p.date >= s))
                .filter(|p| end_date.is_none_or(|e| p.date <= e))
                .copied()
                .collect(),
        )
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from 2020-01-01 with the given closes.
pub fn points_from_closes(closes: &[f64]) -> Vec<PricePoint> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(start + chrono::Duration::days(i as i64), c))
        .collect()
}

pub fn series_from_closes(closes: &[f64]) -> TimeSeries {
    TimeSeries::new(points_from_closes(closes)).unwrap()
}

pub fn constant_series(len: usize, close: f64) -> TimeSeries {
    series_from_closes(&vec![close; len])
}

pub fn linear_series(len: usize, start: f64, step: f64) -> TimeSeries {
    let closes: Vec<f64> = (0..len).map(|i| start + step * i as f64).collect();
    series_from_closes(&closes)
}

/// Sine wave around `base`, giving repeated crossovers.
pub fn wave_series(len: usize, base: f64, amplitude: f64, period: f64) -> TimeSeries {
    let closes: Vec<f64> = (0..len)
        .map(|i| base + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect();
    series_from_closes(&closes)
}

/// `date,close` CSV text for a series.
pub fn to_csv(series: &TimeSeries) -> String {
    let mut out = String::from("date,close\n");
    for p in series.points() {
        out.push_str(&format!("{},{}\n", p.date, p.close));
    }
    out
}
