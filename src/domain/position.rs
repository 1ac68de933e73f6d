//! Tracked positions and their staged additional purchases.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::error::RectrackError;

/// Market a position is listed in; selects the capital denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    Kr,
    Us,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Country::Kr => write!(f, "KR"),
            Country::Us => write!(f, "US"),
        }
    }
}

impl FromStr for Country {
    type Err = RectrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KR" => Ok(Country::Kr),
            "US" => Ok(Country::Us),
            other => Err(RectrackError::invalid_input(
                "country",
                format!("unknown country '{other}' (expected KR or US)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub recommender: String,
    pub country: Country,
    pub rec_date: NaiveDate,
}

/// A position that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub name: String,
    pub code: String,
    pub recommender: String,
    pub country: Country,
    pub rec_date: NaiveDate,
}

impl NewPosition {
    pub fn validate(&self) -> Result<(), RectrackError> {
        if self.code.trim().is_empty() {
            return Err(RectrackError::invalid_input("code", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(RectrackError::invalid_input("name", "must not be empty"));
        }
        Ok(())
    }

    pub fn with_id(self, id: i64) -> Position {
        Position {
            id,
            name: self.name,
            code: self.code,
            recommender: self.recommender,
            country: self.country,
            rec_date: self.rec_date,
        }
    }
}

/// An additional purchase of `ratio` of the fixed capital on `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalBuy {
    pub code: String,
    pub date: NaiveDate,
    pub ratio: f64,
}

impl AdditionalBuy {
    /// Build from a percentage entry, e.g. `30.0` becomes a ratio of `0.3`.
    pub fn from_percent(code: &str, date: NaiveDate, pct: f64) -> Result<Self, RectrackError> {
        if !pct.is_finite() || pct <= 0.0 {
            return Err(RectrackError::invalid_input(
                "ratio",
                "percentage must be greater than zero",
            ));
        }
        if code.trim().is_empty() {
            return Err(RectrackError::invalid_input("code", "must not be empty"));
        }
        Ok(Self {
            code: code.trim().to_string(),
            date,
            ratio: pct / 100.0,
        })
    }

    /// Trimmed, case-insensitive code comparison.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

/// A listed company and its exchange code, used to look up KR tickers by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedCode {
    pub name: String,
    pub code: String,
}
