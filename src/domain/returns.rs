//! Lump-sum, dollar-cost-averaged and capital-constrained composite returns.
//!
//! All three methods share the same basis: the close effective on the
//! recommendation date and the close of the last point in the series. The
//! calculator is total; incomplete data degrades to a zeroed result.

use tracing::debug;

use super::position::{AdditionalBuy, Country, Position};
use super::price::{PricePoint, PriceSeries};

/// Cumulative share of the fixed capital additional purchases may use.
pub const MAX_ADDITIONAL_RATIO: f64 = 0.5;

pub const DEFAULT_CAPITAL_KRW: f64 = 100_000_000.0;
pub const DEFAULT_CAPITAL_USD: f64 = 100_000.0;

/// Fixed capital budget per market for the composite method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalConfig {
    pub krw: f64,
    pub usd: f64,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            krw: DEFAULT_CAPITAL_KRW,
            usd: DEFAULT_CAPITAL_USD,
        }
    }
}

impl CapitalConfig {
    pub fn fixed_capital(&self, country: Country) -> f64 {
        match country {
            Country::Kr => self.krw,
            Country::Us => self.usd,
        }
    }
}

/// Unsuppressed composite totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReturnMeta {
    pub total_invested: f64,
    pub final_eval: f64,
    pub total_qty: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReturnResult {
    pub roi_lump: f64,
    pub roi_dca: f64,
    /// Reported composite return; 0 when no additional purchase applied.
    pub roi_comp: f64,
    pub current_price: f64,
    pub has_additional: bool,
    pub meta: ReturnMeta,
}

impl ReturnResult {
    fn insufficient(current_price: f64) -> Self {
        Self {
            current_price,
            ..Self::default()
        }
    }
}

/// Compute returns with the default capital budget.
pub fn compute_returns(
    position: &Position,
    adds: &[AdditionalBuy],
    prices: &[PricePoint],
) -> ReturnResult {
    compute_returns_with(&CapitalConfig::default(), position, adds, prices)
}

pub fn compute_returns_with(
    capital: &CapitalConfig,
    position: &Position,
    adds: &[AdditionalBuy],
    prices: &[PricePoint],
) -> ReturnResult {
    let series = PriceSeries::new(prices.to_vec());
    compute_series_returns(capital, position, adds, &series)
}

/// Same as [`compute_returns_with`] over an already normalized series.
pub fn compute_series_returns(
    capital: &CapitalConfig,
    position: &Position,
    adds: &[AdditionalBuy],
    series: &PriceSeries,
) -> ReturnResult {
    let Some(last) = series.last() else {
        return ReturnResult::default();
    };
    let current_price = last.close_price;
    let last_date = last.date;
    let base_price = series.price_at(position.rec_date);

    if base_price <= 0.0 || current_price <= 0.0 {
        debug!(
            code = %position.code,
            base_price,
            current_price,
            "insufficient basis data"
        );
        return ReturnResult::insufficient(current_price);
    }

    let roi_lump = (current_price - base_price) / base_price * 100.0;
    let roi_dca = dca_return(series, position, current_price);

    let fixed_capital = capital.fixed_capital(position.country);
    let init_qty = (fixed_capital / base_price).floor();
    let mut total_qty = init_qty;
    let mut total_invested = init_qty * base_price;

    let mut mine: Vec<&AdditionalBuy> = adds
        .iter()
        .filter(|a| a.matches_code(&position.code))
        .collect();
    mine.sort_by_key(|a| a.date);

    let mut allocated = 0.0_f64;
    let mut add_count = 0usize;

    for add in mine {
        if add.date > last_date {
            debug!(code = %position.code, date = %add.date, "skipping purchase after last price");
            continue;
        }
        if allocated + add.ratio > MAX_ADDITIONAL_RATIO {
            debug!(
                code = %position.code,
                date = %add.date,
                ratio = add.ratio,
                allocated,
                "skipping purchase over allocation cap"
            );
            continue;
        }
        let add_price = series.price_at(add.date);
        if add_price <= 0.0 {
            debug!(code = %position.code, date = %add.date, "skipping purchase without price");
            continue;
        }

        let add_shares = (fixed_capital * add.ratio / add_price).floor();
        total_qty += add_shares;
        total_invested += add_shares * add_price;
        allocated += add.ratio;
        add_count += 1;
    }

    let final_eval = total_qty * current_price;
    let roi_comp = if total_invested > 0.0 {
        (final_eval - total_invested) / total_invested * 100.0
    } else {
        0.0
    };

    ReturnResult {
        roi_lump,
        roi_dca,
        roi_comp: if add_count > 0 { roi_comp } else { 0.0 },
        current_price,
        has_additional: add_count > 0,
        meta: ReturnMeta {
            total_invested,
            final_eval,
            total_qty: total_qty as i64,
        },
    }
}

/// One unit bought on every trading day from the recommendation date on.
fn dca_return(series: &PriceSeries, position: &Position, current_price: f64) -> f64 {
    let buys = series.since(position.rec_date);
    if buys.is_empty() {
        return 0.0;
    }
    let total_qty = buys.len() as f64;
    let total_invested: f64 = buys.iter().map(|p| p.close_price).sum();
    if total_invested <= 0.0 {
        return 0.0;
    }
    let current_eval = total_qty * current_price;
    (current_eval - total_invested) / total_invested * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn pt(y: i32, m: u32, day: u32, close: f64) -> PricePoint {
        PricePoint::new(d(y, m, day), close)
    }

    fn position(country: Country, rec_date: NaiveDate) -> Position {
        Position {
            id: 1,
            name: "Test".into(),
            code: "005930".into(),
            recommender: "lee".into(),
            country,
            rec_date,
        }
    }

    fn buy(code: &str, date: NaiveDate, ratio: f64) -> AdditionalBuy {
        AdditionalBuy {
            code: code.into(),
            date,
            ratio,
        }
    }

    #[test]
    fn two_day_series_without_additional_buys() {
        let prices = vec![pt(2024, 1, 1, 100.0), pt(2024, 1, 2, 110.0)];
        let result = compute_returns(&position(Country::Kr, d(2024, 1, 1)), &[], &prices);

        assert_relative_eq!(result.roi_lump, 10.0, epsilon = 1e-9);
        assert_relative_eq!(result.roi_dca, 10.0 / 210.0 * 100.0, epsilon = 1e-9);
        assert_eq!(result.roi_comp, 0.0);
        assert!(!result.has_additional);
        assert_eq!(result.current_price, 110.0);
        assert_eq!(result.meta.total_qty, 1_000_000);
        assert_relative_eq!(result.meta.total_invested, 100_000_000.0);
        assert_relative_eq!(result.meta.final_eval, 110_000_000.0);
    }

    #[test]
    fn empty_series_is_all_zero() {
        let result = compute_returns(&position(Country::Kr, d(2024, 1, 1)), &[], &[]);
        assert_eq!(result, ReturnResult::default());
    }

    #[test]
    fn rec_date_before_data_keeps_current_price() {
        let prices = vec![pt(2024, 1, 5, 100.0), pt(2024, 1, 6, 120.0)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &[], &prices);
        assert_eq!(result.roi_lump, 0.0);
        assert_eq!(result.roi_dca, 0.0);
        assert_eq!(result.roi_comp, 0.0);
        assert_eq!(result.current_price, 120.0);
        assert!(!result.has_additional);
        assert_eq!(result.meta, ReturnMeta::default());
    }

    #[test]
    fn zero_current_price_is_guarded() {
        let prices = vec![pt(2024, 1, 1, 100.0), pt(2024, 1, 2, 0.0)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &[], &prices);
        assert_eq!(result, ReturnResult::default());
    }

    #[test]
    fn unsorted_input_uses_chronological_last() {
        let prices = vec![pt(2024, 1, 3, 130.0), pt(2024, 1, 1, 100.0), pt(2024, 1, 2, 90.0)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &[], &prices);
        assert_eq!(result.current_price, 130.0);
        assert_relative_eq!(result.roi_lump, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn rec_date_on_holiday_carries_forward() {
        let prices = vec![pt(2024, 1, 1, 100.0), pt(2024, 1, 4, 150.0)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 2)), &[], &prices);
        assert_relative_eq!(result.roi_lump, 50.0, epsilon = 1e-9);
        // Only 01-04 is on or after the rec date.
        assert_eq!(result.roi_dca, 0.0);
    }

    #[test]
    fn composite_applies_additional_buy() {
        let prices = vec![
            pt(2024, 1, 1, 100.0),
            pt(2024, 1, 2, 80.0),
            pt(2024, 1, 3, 120.0),
        ];
        let adds = vec![buy("005930", d(2024, 1, 2), 0.2)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &adds, &prices);

        // init: 100_000 / 100 = 1000 shares, 100_000 invested
        // add: 20_000 / 80 = 250 shares, 20_000 invested
        assert!(result.has_additional);
        assert_eq!(result.meta.total_qty, 1250);
        assert_relative_eq!(result.meta.total_invested, 120_000.0);
        assert_relative_eq!(result.meta.final_eval, 150_000.0);
        assert_relative_eq!(result.roi_comp, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn share_quantities_truncate() {
        let prices = vec![pt(2024, 1, 1, 300.0), pt(2024, 1, 2, 700.0)];
        let adds = vec![buy("005930", d(2024, 1, 2), 0.1)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &adds, &prices);
        // floor(100_000 / 300) = 333, floor(10_000 / 700) = 14
        assert_eq!(result.meta.total_qty, 347);
        assert_relative_eq!(result.meta.total_invested, 333.0 * 300.0 + 14.0 * 700.0);
    }

    #[test]
    fn cap_is_checked_in_date_order() {
        let prices = vec![
            pt(2024, 1, 1, 100.0),
            pt(2024, 1, 2, 100.0),
            pt(2024, 1, 3, 100.0),
        ];
        let adds = vec![
            buy("005930", d(2024, 1, 3), 0.3),
            buy("005930", d(2024, 1, 2), 0.3),
        ];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &adds, &prices);
        // 01-02 applied (0.3); 01-03 would reach 0.6 and is skipped.
        assert_eq!(result.meta.total_qty, 1000 + 300);
        assert!(result.has_additional);
    }

    #[test]
    fn later_smaller_buy_fits_remaining_headroom() {
        let prices = vec![pt(2024, 1, 1, 100.0), pt(2024, 1, 5, 100.0)];
        let adds = vec![
            buy("005930", d(2024, 1, 2), 0.4),
            buy("005930", d(2024, 1, 3), 0.2),
            buy("005930", d(2024, 1, 4), 0.1),
        ];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &adds, &prices);
        // 0.4 applied, 0.2 skipped, 0.1 applied -> 0.5
        assert_eq!(result.meta.total_qty, 1000 + 400 + 100);
    }

    #[test]
    fn future_buy_is_ignored() {
        let prices = vec![pt(2024, 1, 1, 100.0), pt(2024, 1, 2, 110.0)];
        let adds = vec![buy("005930", d(2024, 1, 3), 0.1)];
        let result = compute_returns(&position(Country::Kr, d(2024, 1, 1)), &adds, &prices);
        assert!(!result.has_additional);
        assert_eq!(result.roi_comp, 0.0);
        assert_eq!(result.meta.total_qty, 1_000_000);
    }

    #[test]
    fn buy_before_any_price_is_ignored() {
        let prices = vec![pt(2024, 1, 2, 100.0), pt(2024, 1, 3, 110.0)];
        let adds = vec![buy("005930", d(2024, 1, 1), 0.1)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 2)), &adds, &prices);
        assert!(!result.has_additional);
        assert_eq!(result.meta.total_qty, 1000);
    }

    #[test]
    fn buy_before_rec_date_is_not_prefiltered() {
        let prices = vec![pt(2024, 1, 1, 50.0), pt(2024, 1, 2, 100.0), pt(2024, 1, 3, 100.0)];
        let adds = vec![buy("005930", d(2024, 1, 1), 0.1)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 2)), &adds, &prices);
        assert!(result.has_additional);
        // 1000 initial + floor(10_000 / 50) = 200
        assert_eq!(result.meta.total_qty, 1200);
    }

    #[test]
    fn other_codes_are_ignored_and_codes_match_loosely() {
        let prices = vec![pt(2024, 1, 1, 100.0), pt(2024, 1, 2, 100.0)];
        let mut pos = position(Country::Us, d(2024, 1, 1));
        pos.code = "aapl".into();
        let adds = vec![
            buy("MSFT", d(2024, 1, 2), 0.1),
            buy(" AAPL ", d(2024, 1, 2), 0.1),
        ];
        let result = compute_returns(&pos, &adds, &prices);
        assert_eq!(result.meta.total_qty, 1100);
    }

    #[test]
    fn country_selects_capital() {
        let prices = vec![pt(2024, 1, 1, 1000.0), pt(2024, 1, 2, 1000.0)];
        let kr = compute_returns(&position(Country::Kr, d(2024, 1, 1)), &[], &prices);
        let us = compute_returns(&position(Country::Us, d(2024, 1, 1)), &[], &prices);
        assert_eq!(kr.meta.total_qty, 100_000);
        assert_eq!(us.meta.total_qty, 100);

        let capital = CapitalConfig {
            krw: 5_000.0,
            usd: 2_000.0,
        };
        let custom = compute_returns_with(&capital, &position(Country::Us, d(2024, 1, 1)), &[], &prices);
        assert_eq!(custom.meta.total_qty, 2);
    }

    #[test]
    fn price_above_capital_buys_nothing() {
        let prices = vec![pt(2024, 1, 1, 200_000.0), pt(2024, 1, 2, 210_000.0)];
        let result = compute_returns(&position(Country::Us, d(2024, 1, 1)), &[], &prices);
        assert_eq!(result.meta.total_qty, 0);
        assert_eq!(result.meta.total_invested, 0.0);
        assert_eq!(result.roi_comp, 0.0);
        assert_relative_eq!(result.roi_lump, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let prices = vec![pt(2024, 1, 1, 101.3), pt(2024, 1, 2, 97.1), pt(2024, 1, 3, 105.9)];
        let adds = vec![buy("005930", d(2024, 1, 2), 0.15)];
        let pos = position(Country::Kr, d(2024, 1, 1));
        let a = compute_returns(&pos, &adds, &prices);
        let b = compute_returns(&pos, &adds, &prices);
        assert_eq!(a.roi_comp.to_bits(), b.roi_comp.to_bits());
        assert_eq!(a, b);
    }
}
