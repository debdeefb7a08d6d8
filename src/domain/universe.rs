//! Instrument universe resolution.
//!
//! The universe is either a configured code list or every distinct code the
//! data source knows about, optionally cut down to its first `limit` entries.

use crate::domain::error::ScanError;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_string();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Resolve the ordered list of codes to process.
///
/// A failure to enumerate the data source is fatal for the batch.
pub fn resolve_universe(
    data_port: &dyn DataPort,
    configured: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<String>, ScanError> {
    let mut codes = match configured.filter(|s| !s.trim().is_empty()) {
        Some(list) => parse_codes(list).map_err(|e| ScanError::ConfigInvalid {
            section: "scan".to_string(),
            key: "codes".to_string(),
            reason: e.to_string(),
        })?,
        None => data_port.list_codes()?,
    };

    if let Some(n) = limit {
        codes.truncate(n);
    }

    Ok(codes)
}
