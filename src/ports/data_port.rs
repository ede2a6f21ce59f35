//! Price data access port trait.

use crate::domain::error::MacrossError;
use crate::domain::price::TimeSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Closing prices in `[start_date, end_date]`; either bound may be open.
    fn fetch_series(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<TimeSeries, MacrossError>;
}
