//! Domain error types.

/// Top-level error type for rectrack.
///
/// The return calculator itself never fails; these errors come from the
/// stores, the configuration layer and input validation around it.
#[derive(Debug, thiserror::Error)]
pub enum RectrackError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("position {id} not found")]
    PositionNotFound { id: i64 },

    #[error("no price data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RectrackError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        RectrackError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&RectrackError> for std::process::ExitCode {
    fn from(err: &RectrackError) -> Self {
        let code: u8 = match err {
            RectrackError::Io(_) => 1,
            RectrackError::ConfigParse { .. }
            | RectrackError::ConfigMissing { .. }
            | RectrackError::ConfigInvalid { .. } => 2,
            RectrackError::Database { .. } | RectrackError::DatabaseQuery { .. } => 3,
            RectrackError::InvalidInput { .. } | RectrackError::PositionNotFound { .. } => 4,
            RectrackError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
