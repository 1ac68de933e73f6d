//! CSV file price series adapter.
//!
//! One file per instrument, `<dir>/price_<CODE>.csv`, with a
//! `date,close_price` header.

use crate::adapters::price_table_name;
use crate::domain::error::RectrackError;
use crate::domain::position::ListedCode;
use crate::domain::price::PricePoint;
use crate::ports::price_port::PriceSeriesPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: String,
    close_price: f64,
}

#[derive(Debug, Deserialize)]
struct CodeRow {
    name: String,
    code: String,
}

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> Result<PathBuf, RectrackError> {
        Ok(self.base_path.join(format!("{}.csv", price_table_name(code)?)))
    }
}

/// Parse `date,close_price` rows from any reader. Output keeps file order.
pub fn read_price_rows<R: Read>(reader: R) -> Result<Vec<PricePoint>, RectrackError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for result in rdr.deserialize() {
        let row: PriceRow = result.map_err(|e| RectrackError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
            RectrackError::Database {
                reason: format!("invalid date format '{}': {}", row.date, e),
            }
        })?;
        if !row.close_price.is_finite() || row.close_price < 0.0 {
            return Err(RectrackError::Database {
                reason: format!("invalid close_price {} on {}", row.close_price, date),
            });
        }
        points.push(PricePoint::new(date, row.close_price));
    }

    Ok(points)
}

pub fn read_price_file(path: &Path) -> Result<Vec<PricePoint>, RectrackError> {
    let file = std::fs::File::open(path).map_err(|e| RectrackError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    read_price_rows(file)
}

/// Parse a `name,code` listing. Codes stay text so leading zeros survive.
pub fn read_code_rows<R: Read>(reader: R) -> Result<Vec<ListedCode>, RectrackError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut codes = Vec::new();

    for result in rdr.deserialize() {
        let row: CodeRow = result.map_err(|e| RectrackError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;
        if row.name.trim().is_empty() || row.code.trim().is_empty() {
            return Err(RectrackError::invalid_input(
                "code",
                format!("listing row '{},{}' has an empty field", row.name, row.code),
            ));
        }
        codes.push(ListedCode {
            name: row.name.trim().to_string(),
            code: row.code.trim().to_string(),
        });
    }

    Ok(codes)
}

pub fn read_code_file(path: &Path) -> Result<Vec<ListedCode>, RectrackError> {
    let file = std::fs::File::open(path).map_err(|e| RectrackError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    read_code_rows(file)
}

impl PriceSeriesPort for CsvPriceAdapter {
    fn fetch_series(&self, code: &str) -> Result<Option<Vec<PricePoint>>, RectrackError> {
        let path = self.csv_path(code)?;
        if !path.exists() {
            return Ok(None);
        }
        let mut points = read_price_file(&path)?;
        points.sort_by_key(|p| p.date);
        Ok(Some(points))
    }
}
