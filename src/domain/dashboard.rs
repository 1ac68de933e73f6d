//! Portfolio-wide evaluation over the price provider.

use tracing::warn;

use super::position::{AdditionalBuy, Position};
use super::price::PriceSeries;
use super::returns::{compute_series_returns, CapitalConfig, ReturnResult};
use crate::ports::price_port::PriceSeriesPort;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRow {
    pub position: Position,
    pub result: ReturnResult,
    /// No price series has been collected for this position yet.
    pub pending: bool,
}

/// Evaluate every position independently, sorted by recommendation date.
///
/// A provider failure for one position is logged and reported as a zeroed
/// row; it never aborts the other positions.
pub fn evaluate_portfolio(
    provider: &dyn PriceSeriesPort,
    positions: &[Position],
    adds: &[AdditionalBuy],
    capital: &CapitalConfig,
) -> Vec<DashboardRow> {
    let mut rows: Vec<DashboardRow> = positions
        .iter()
        .map(|position| evaluate_position(provider, position, adds, capital))
        .collect();
    rows.sort_by_key(|r| r.position.rec_date);
    rows
}

pub fn evaluate_position(
    provider: &dyn PriceSeriesPort,
    position: &Position,
    adds: &[AdditionalBuy],
    capital: &CapitalConfig,
) -> DashboardRow {
    let (series, pending) = match provider.fetch_series(&position.code) {
        Ok(Some(points)) => (PriceSeries::new(points), false),
        Ok(None) => (PriceSeries::default(), true),
        Err(e) => {
            warn!(code = %position.code, error = %e, "price series unavailable");
            (PriceSeries::default(), false)
        }
    };

    DashboardRow {
        position: position.clone(),
        result: compute_series_returns(capital, position, adds, &series),
        pending,
    }
}
