//! Configuration validation and typed settings.
//!
//! Validates all config fields before any store is opened.

use crate::domain::error::RectrackError;
use crate::domain::returns::{CapitalConfig, DEFAULT_CAPITAL_KRW, DEFAULT_CAPITAL_USD};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

/// Where price series are read from.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    Sqlite,
    Csv { dir: PathBuf },
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RectrackError> {
    validate_capital(config, "krw", DEFAULT_CAPITAL_KRW)?;
    validate_capital(config, "usd", DEFAULT_CAPITAL_USD)?;
    validate_price_source(config)?;
    validate_sqlite(config)?;
    Ok(())
}

pub fn build_capital_config(config: &dyn ConfigPort) -> Result<CapitalConfig, RectrackError> {
    Ok(CapitalConfig {
        krw: validate_capital(config, "krw", DEFAULT_CAPITAL_KRW)?,
        usd: validate_capital(config, "usd", DEFAULT_CAPITAL_USD)?,
    })
}

pub fn build_price_source(config: &dyn ConfigPort) -> Result<PriceSource, RectrackError> {
    validate_price_source(config)
}

fn validate_capital(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, RectrackError> {
    if config.has_key("capital", key) && config.get_double("capital", key, f64::NAN).is_nan() {
        return Err(RectrackError::ConfigInvalid {
            section: "capital".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a number"),
        });
    }
    let value = config.get_double("capital", key, default);
    if !value.is_finite() || value <= 0.0 {
        return Err(RectrackError::ConfigInvalid {
            section: "capital".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be positive"),
        });
    }
    Ok(value)
}

fn validate_price_source(config: &dyn ConfigPort) -> Result<PriceSource, RectrackError> {
    let source = config
        .get_string("prices", "source")
        .unwrap_or_else(|| "sqlite".to_string());

    match source.trim().to_lowercase().as_str() {
        "sqlite" => Ok(PriceSource::Sqlite),
        "csv" => match config.get_string("prices", "dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(PriceSource::Csv {
                dir: PathBuf::from(dir.trim()),
            }),
            _ => Err(RectrackError::ConfigMissing {
                section: "prices".to_string(),
                key: "dir".to_string(),
            }),
        },
        other => Err(RectrackError::ConfigInvalid {
            section: "prices".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source '{other}' (expected sqlite or csv)"),
        }),
    }
}

fn validate_sqlite(config: &dyn ConfigPort) -> Result<(), RectrackError> {
    match config.get_string("sqlite", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(RectrackError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            });
        }
    }
    if config.get_int("sqlite", "pool_size", 4) < 1 {
        return Err(RectrackError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}
