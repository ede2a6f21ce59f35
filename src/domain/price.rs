//! Closing-price history for a single instrument.

use chrono::NaiveDate;

use super::error::MacrossError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PricePoint { date, close }
    }
}

/// Chronologically ordered, date-unique price history.
///
/// Construction rejects unordered or duplicate dates and non-positive closes,
/// so every component downstream can rely on strictly increasing dates.
/// An empty series can be built; operations that need data reject it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    points: Vec<PricePoint>,
}

impl TimeSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, MacrossError> {
        for point in &points {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(MacrossError::InvalidPrice {
                    date: point.date,
                    close: point.close,
                });
            }
        }
        if let Some(w) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(MacrossError::UnorderedSeries { date: w[1].date });
        }
        Ok(TimeSeries { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    /// Points with index in `[start, end)`, clamped to the series length.
    pub fn slice(&self, start: usize, end: usize) -> TimeSeries {
        let end = end.min(self.points.len());
        let start = start.min(end);
        TimeSeries {
            points: self.points[start..end].to_vec(),
        }
    }

    pub(crate) fn require_non_empty(&self) -> Result<(), MacrossError> {
        if self.points.is_empty() {
            Err(MacrossError::EmptySeries)
        } else {
            Ok(())
        }
    }
}
