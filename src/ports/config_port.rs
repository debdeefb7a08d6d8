//! Configuration access port trait.

use crate::domain::error::ScanError;
use std::str::FromStr;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is absent or blank; `ConfigInvalid` when it is not an integer.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ScanError> {
        parse_value(self.get_string(section, key), section, key, "an integer")
            .map(|v| v.unwrap_or(default))
    }

    /// `default` when the key is absent or blank; `ConfigInvalid` when it is not a finite number.
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ScanError> {
        match parse_value::<f64>(self.get_string(section, key), section, key, "a number")? {
            Some(v) if !v.is_finite() => Err(ScanError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("{key} must be a finite number"),
            }),
            Some(v) => Ok(v),
            None => Ok(default),
        }
    }

    /// A non-blank string value, or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, ScanError> {
        self.get_string(section, key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ScanError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}

fn parse_value<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, ScanError> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ScanError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not {expected}", raw.trim()),
        })
}
