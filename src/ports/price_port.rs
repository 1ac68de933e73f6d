//! Price series provider port.

use crate::domain::error::RectrackError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait PriceSeriesPort {
    /// Full daily close history for `code`.
    ///
    /// `Ok(None)` means the series has not been collected yet, as opposed to
    /// `Ok(Some(vec![]))` for a collected but empty series.
    fn fetch_series(&self, code: &str) -> Result<Option<Vec<PricePoint>>, RectrackError>;

    /// History restricted to points dated on or before `end`.
    fn fetch_series_until(
        &self,
        code: &str,
        end: NaiveDate,
    ) -> Result<Option<Vec<PricePoint>>, RectrackError> {
        Ok(self
            .fetch_series(code)?
            .map(|points| points.into_iter().filter(|p| p.date <= end).collect()))
    }
}
