//! Scan parameters: thresholds, history and window sizes, inclusion policy.

use crate::domain::bar::parse_trade_date;
use crate::domain::calendar::DEFAULT_CUTOFF_HOUR;
use crate::domain::error::ScanError;
use crate::domain::exit::ExitThresholds;
use crate::domain::indicator::MacdParams;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MIN_HISTORY: usize = 35;
pub const DEFAULT_WINDOW_SIZE: usize = 20;
pub const DEFAULT_TOP: usize = 10;
pub const DEFAULT_OUTPUT: &str = "macd_result.json";

/// Which instruments make it into the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InclusionPolicy {
    /// The bar for the latest resolved trading day must itself be a buy bar.
    #[default]
    LatestSignal,
    /// Any buy signal anywhere in the history qualifies.
    AnySignal,
}

impl FromStr for InclusionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" | "strict" => Ok(Self::LatestSignal),
            "any" | "loose" => Ok(Self::AnySignal),
            other => Err(format!("unknown inclusion policy '{other}' (expected latest or any)")),
        }
    }
}

impl fmt::Display for InclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LatestSignal => write!(f, "latest"),
            Self::AnySignal => write!(f, "any"),
        }
    }
}

/// Where daily bars are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Postgres,
    Sqlite,
    Csv,
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown data source '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub macd: MacdParams,
    pub thresholds: ExitThresholds,
    pub min_history: usize,
    pub window_size: usize,
    pub inclusion: InclusionPolicy,
    pub cutoff_hour: u32,
    /// Pins the latest trading day instead of resolving it from the clock.
    pub as_of: Option<NaiveDate>,
    pub top: usize,
    /// Only the first `limit` instruments of the universe are processed.
    pub limit: Option<usize>,
    pub output: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            macd: MacdParams::default(),
            thresholds: ExitThresholds::default(),
            min_history: DEFAULT_MIN_HISTORY,
            window_size: DEFAULT_WINDOW_SIZE,
            inclusion: InclusionPolicy::default(),
            cutoff_hour: DEFAULT_CUTOFF_HOUR,
            as_of: None,
            top: DEFAULT_TOP,
            limit: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl ScanConfig {
    /// Build from the `[scan]` section, falling back to defaults for absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScanError> {
        let defaults = Self::default();

        let inclusion = match config.get_string("scan", "inclusion") {
            Some(raw) => raw
                .parse::<InclusionPolicy>()
                .map_err(|reason| invalid("inclusion", reason))?,
            None => defaults.inclusion,
        };

        let as_of = match config.get_string("scan", "as_of") {
            Some(raw) if !raw.trim().is_empty() => Some(
                parse_trade_date(&raw)
                    .ok_or_else(|| invalid("as_of", "expected YYYY-MM-DD or YYYYMMDD".into()))?,
            ),
            _ => None,
        };

        let limit = match config.get_int("scan", "limit", 0)? {
            n if n > 0 => Some(n as usize),
            _ => None,
        };

        Ok(Self {
            macd: MacdParams {
                fast: non_negative(config, "macd_fast", defaults.macd.fast)?,
                slow: non_negative(config, "macd_slow", defaults.macd.slow)?,
                signal: non_negative(config, "macd_signal", defaults.macd.signal)?,
            },
            thresholds: ExitThresholds {
                profit: config.get_double("scan", "profit_threshold", defaults.thresholds.profit)?,
                loss: config.get_double("scan", "loss_threshold", defaults.thresholds.loss)?,
            },
            min_history: non_negative(config, "min_history", defaults.min_history)?,
            window_size: non_negative(config, "window_size", defaults.window_size)?,
            inclusion,
            cutoff_hour: non_negative(config, "cutoff_hour", defaults.cutoff_hour as usize)? as u32,
            as_of,
            top: non_negative(config, "top", defaults.top)?,
            limit,
            output: config
                .get_string("scan", "output")
                .map(PathBuf::from)
                .unwrap_or(defaults.output),
        })
    }
}

fn non_negative(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ScanError> {
    let value = config.get_int("scan", key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(key, format!("{key} must be non-negative")))
}

fn invalid(key: &str, reason: String) -> ScanError {
    ScanError::ConfigInvalid {
        section: "scan".to_string(),
        key: key.to_string(),
        reason,
    }
}
