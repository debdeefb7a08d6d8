//! Domain error types.

/// Top-level error type for macdscan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
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

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("malformed data for {code}: {reason}")]
    MalformedData { code: String, reason: String },

    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// True for failures that only concern one instrument's data and must not
    /// abort the batch.
    pub fn is_per_instrument(&self) -> bool {
        matches!(
            self,
            ScanError::Database { .. }
                | ScanError::DatabaseQuery { .. }
                | ScanError::NoData { .. }
                | ScanError::MalformedData { .. }
        )
    }
}

impl From<&ScanError> for std::process::ExitCode {
    fn from(err: &ScanError) -> Self {
        let code: u8 = match err {
            ScanError::Io(_) | ScanError::Serialize(_) => 1,
            ScanError::ConfigParse { .. }
            | ScanError::ConfigMissing { .. }
            | ScanError::ConfigInvalid { .. } => 2,
            ScanError::Database { .. } | ScanError::DatabaseQuery { .. } => 3,
            ScanError::NoData { .. } | ScanError::MalformedData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
