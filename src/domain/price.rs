//! Daily closing prices and date lookup with non-trading-day carry-forward.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close_price: f64) -> Self {
        Self { date, close_price }
    }
}

/// A price series normalized to ascending date order.
///
/// Sorting is stable, so points sharing a date keep their input order and
/// the first one wins on lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
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

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Close of the chronologically last point, or 0 for an empty series.
    pub fn current_price(&self) -> f64 {
        self.points.last().map(|p| p.close_price).unwrap_or(0.0)
    }

    /// Close effective on `target`.
    ///
    /// Exact date match first, otherwise the latest point before `target`.
    /// Returns 0 when `target` predates every point or the series is empty;
    /// callers treat 0 as "no basis price".
    pub fn price_at(&self, target: NaiveDate) -> f64 {
        // First index with date > target; everything before it is <= target.
        let end = self.points.partition_point(|p| p.date <= target);
        if end == 0 {
            return 0.0;
        }
        let last = &self.points[end - 1];
        if last.date == target {
            let start = self.points[..end].partition_point(|p| p.date < target);
            return self.points[start].close_price;
        }
        last.close_price
    }

    /// Points dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[PricePoint] {
        let from = self.points.partition_point(|p| p.date < start);
        &self.points[from..]
    }

    /// Copy of the series restricted to points dated on or before `end`.
    pub fn truncated_to(&self, end: NaiveDate) -> PriceSeries {
        let to = self.points.partition_point(|p| p.date <= end);
        PriceSeries {
            points: self.points[..to].to_vec(),
        }
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        PriceSeries::new(points)
    }
}

/// Lookup over an arbitrarily ordered slice. Normalizes a copy first.
pub fn price_at(points: &[PricePoint], target: NaiveDate) -> f64 {
    PriceSeries::new(points.to_vec()).price_at(target)
}
