#![allow(dead_code)]

use chrono::NaiveDate;
use rectrack::domain::closeout::ClosedPosition;
use rectrack::domain::error::RectrackError;
use rectrack::domain::position::{AdditionalBuy, Country, ListedCode, NewPosition, Position};
pub use rectrack::domain::price::PricePoint;
use rectrack::ports::price_port::PriceSeriesPort;
use rectrack::ports::store_port::{
    AdditionalBuyStore, CloseOutStore, ClosedPositionArchive, CodeDirectory, PositionStore,
};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPriceProvider {
    pub series: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceProvider {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, code: &str, points: Vec<PricePoint>) -> Self {
        self.series.insert(code.to_string(), points);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl PriceSeriesPort for MockPriceProvider {
    fn fetch_series(&self, code: &str) -> Result<Option<Vec<PricePoint>>, RectrackError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(RectrackError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.series.get(code).cloned())
    }
}

/// In-memory stand-in for every record store.
#[derive(Default)]
pub struct MemoryStore {
    pub positions: RefCell<Vec<Position>>,
    pub buys: RefCell<Vec<AdditionalBuy>>,
    pub closed: RefCell<Vec<ClosedPosition>>,
    pub codes: RefCell<Vec<ListedCode>>,
    next_id: RefCell<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(self, position: Position) -> Self {
        {
            let mut next = self.next_id.borrow_mut();
            *next = (*next).max(position.id);
        }
        self.positions.borrow_mut().push(position);
        self
    }

    pub fn with_buy(self, buy: AdditionalBuy) -> Self {
        self.buys.borrow_mut().push(buy);
        self
    }
}

impl PositionStore for MemoryStore {
    fn list_positions(&self) -> Result<Vec<Position>, RectrackError> {
        Ok(self.positions.borrow().clone())
    }

    fn find_position(&self, id: i64) -> Result<Option<Position>, RectrackError> {
        Ok(self.positions.borrow().iter().find(|p| p.id == id).cloned())
    }

    fn insert_position(&self, position: &NewPosition) -> Result<i64, RectrackError> {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        self.positions
            .borrow_mut()
            .push(position.clone().with_id(*next));
        Ok(*next)
    }

    fn delete_position(&self, id: i64) -> Result<bool, RectrackError> {
        let mut positions = self.positions.borrow_mut();
        let before = positions.len();
        positions.retain(|p| p.id != id);
        Ok(positions.len() != before)
    }
}

impl AdditionalBuyStore for MemoryStore {
    fn list_additional_buys(&self) -> Result<Vec<AdditionalBuy>, RectrackError> {
        Ok(self.buys.borrow().clone())
    }

    fn insert_additional_buy(&self, buy: &AdditionalBuy) -> Result<(), RectrackError> {
        self.buys.borrow_mut().push(buy.clone());
        Ok(())
    }
}

impl ClosedPositionArchive for MemoryStore {
    fn archive(&self, record: &ClosedPosition) -> Result<(), RectrackError> {
        self.closed.borrow_mut().push(record.clone());
        Ok(())
    }

    fn list_closed(&self) -> Result<Vec<ClosedPosition>, RectrackError> {
        let mut records = self.closed.borrow().clone();
        records.sort_by(|a, b| b.sell_date.cmp(&a.sell_date));
        Ok(records)
    }
}

impl CloseOutStore for MemoryStore {
    fn close_out(&self, id: i64, record: &ClosedPosition) -> Result<(), RectrackError> {
        if !self.delete_position(id)? {
            return Err(RectrackError::PositionNotFound { id });
        }
        self.archive(record)
    }
}

impl CodeDirectory for MemoryStore {
    fn search_codes(&self, query: &str, limit: usize) -> Result<Vec<ListedCode>, RectrackError> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .codes
            .borrow()
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn point(date_str: &str, close: f64) -> PricePoint {
    PricePoint::new(
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        close,
    )
}

pub fn make_position(id: i64, code: &str, country: Country, rec_date: &str) -> Position {
    Position {
        id,
        name: format!("{code} Corp"),
        code: code.to_string(),
        recommender: "analyst".to_string(),
        country,
        rec_date: NaiveDate::parse_from_str(rec_date, "%Y-%m-%d").unwrap(),
    }
}

pub fn make_buy(code: &str, date_str: &str, ratio: f64) -> AdditionalBuy {
    AdditionalBuy {
        code: code.to_string(),
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        ratio,
    }
}

/// `count` consecutive calendar days of closes rising by 1 from `start_price`.
pub fn generate_series(start_date: &str, count: usize, start_price: f64) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| PricePoint::new(start + chrono::Duration::days(i as i64), start_price + i as f64))
        .collect()
}
