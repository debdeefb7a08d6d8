//! Configuration validation.
//!
//! Validates every scan and data-source field before any data is read.

use crate::domain::bar::parse_trade_date;
use crate::domain::error::ScanError;
use crate::domain::scan_config::{DataSource, InclusionPolicy};
use crate::ports::config_port::ConfigPort;

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), ScanError> {
    validate_thresholds(config)?;
    validate_sizes(config)?;
    validate_inclusion(config)?;
    validate_cutoff_hour(config)?;
    validate_as_of(config)?;
    Ok(())
}

pub fn validate_source_config(config: &dyn ConfigPort) -> Result<DataSource, ScanError> {
    let source: DataSource = config
        .require_string("scan", "source")?
        .parse()
        .map_err(|reason| invalid("scan", "source", reason))?;

    match source {
        DataSource::Postgres => {
            config.require_string("database", "conninfo")?;
            if let Some(table) = config.get_string("database", "table") {
                validate_table_name(&table)?;
            }
        }
        DataSource::Sqlite => {
            config.require_string("sqlite", "path")?;
        }
        DataSource::Csv => {
            config.require_string("csv", "dir")?;
        }
    }
    Ok(source)
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), ScanError> {
    let profit = config.get_double("scan", "profit_threshold", 0.05)?;
    if !(profit > 0.0) {
        return Err(invalid(
            "scan",
            "profit_threshold",
            "profit_threshold must be positive".to_string(),
        ));
    }
    let loss = config.get_double("scan", "loss_threshold", -0.03)?;
    if !(loss < 0.0 && loss > -1.0) {
        return Err(invalid(
            "scan",
            "loss_threshold",
            "loss_threshold must be between -1 and 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_sizes(config: &dyn ConfigPort) -> Result<(), ScanError> {
    let checks = [
        ("min_history", 35, 2),
        ("window_size", 20, 1),
        ("top", 10, 1),
        ("macd_fast", 12, 1),
        ("macd_slow", 26, 1),
        ("macd_signal", 9, 1),
    ];
    for (key, default, minimum) in checks {
        if config.get_int("scan", key, default)? < minimum {
            return Err(invalid("scan", key, format!("{key} must be at least {minimum}")));
        }
    }
    if config.get_int("scan", "limit", 0)? < 0 {
        return Err(invalid("scan", "limit", "limit must be non-negative".to_string()));
    }
    Ok(())
}

fn validate_inclusion(config: &dyn ConfigPort) -> Result<(), ScanError> {
    if let Some(raw) = config.get_string("scan", "inclusion") {
        raw.parse::<InclusionPolicy>()
            .map_err(|reason| invalid("scan", "inclusion", reason))?;
    }
    Ok(())
}

fn validate_cutoff_hour(config: &dyn ConfigPort) -> Result<(), ScanError> {
    let hour = config.get_int("scan", "cutoff_hour", 18)?;
    if !(0..=23).contains(&hour) {
        return Err(invalid(
            "scan",
            "cutoff_hour",
            "cutoff_hour must be between 0 and 23".to_string(),
        ));
    }
    Ok(())
}

fn validate_as_of(config: &dyn ConfigPort) -> Result<(), ScanError> {
    match config.get_string("scan", "as_of") {
        Some(raw) if !raw.trim().is_empty() && parse_trade_date(&raw).is_none() => Err(invalid(
            "scan",
            "as_of",
            "invalid as_of format, expected YYYY-MM-DD".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(table: &str) -> Result<(), ScanError> {
    let ok = !table.is_empty()
        && table
            .split('.')
            .all(|part| {
                !part.is_empty()
                    && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    && !part.starts_with(|c: char| c.is_ascii_digit())
            });
    if ok {
        Ok(())
    } else {
        Err(invalid(
            "database",
            "table",
            format!("'{table}' is not a valid table name"),
        ))
    }
}

fn invalid(section: &str, key: &str, reason: String) -> ScanError {
    ScanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
