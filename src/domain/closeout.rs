//! Close-out (sell) records.

use chrono::NaiveDate;

use super::error::RectrackError;
use super::position::{AdditionalBuy, Country, Position};
use super::price::{PricePoint, PriceSeries};
use super::returns::{compute_series_returns, CapitalConfig};

/// A position finalized at `sell_date`, as stored in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub name: String,
    pub code: String,
    pub recommender: String,
    pub country: Country,
    pub rec_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub return_lump: f64,
    pub return_dca: f64,
    /// Reported composite return (0 when no additional purchase applied).
    pub return_comp: f64,
    pub total_invested: f64,
    pub final_eval: f64,
    pub note: String,
}

/// Evaluate `position` as of `sell_date` using only prices up to that date.
pub fn close_position(
    capital: &CapitalConfig,
    position: &Position,
    adds: &[AdditionalBuy],
    prices: &[PricePoint],
    sell_date: NaiveDate,
) -> Result<ClosedPosition, RectrackError> {
    let series = PriceSeries::new(prices.to_vec()).truncated_to(sell_date);
    if series.is_empty() {
        return Err(RectrackError::NoData {
            code: position.code.clone(),
        });
    }

    let result = compute_series_returns(capital, position, adds, &series);

    Ok(ClosedPosition {
        name: position.name.clone(),
        code: position.code.clone(),
        recommender: position.recommender.clone(),
        country: position.country,
        rec_date: position.rec_date,
        sell_date,
        return_lump: result.roi_lump,
        return_dca: result.roi_dca,
        return_comp: result.roi_comp,
        total_invested: result.meta.total_invested,
        final_eval: result.meta.final_eval,
        note: format!("sell price: {}", result.current_price),
    })
}
