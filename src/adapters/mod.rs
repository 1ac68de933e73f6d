//! Concrete adapter implementations for ports.

#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod csv_adapter;
pub mod csv_report;
pub mod file_config_adapter;
pub mod text_report;

use crate::domain::error::RectrackError;

/// Storage name of the price series for `code`, e.g. `BRK.B` -> `price_BRK_B`.
///
/// Used as a SQLite table name and a CSV file stem, so anything outside
/// `[A-Z0-9_]` after normalization is rejected.
pub fn price_table_name(code: &str) -> Result<String, RectrackError> {
    let safe = code.trim().to_uppercase().replace(['.', '-'], "_");
    if safe.is_empty() {
        return Err(RectrackError::invalid_input("code", "must not be empty"));
    }
    if !safe.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RectrackError::invalid_input(
            "code",
            format!("'{}' contains unsupported characters", code.trim()),
        ));
    }
    Ok(format!("price_{safe}"))
}
