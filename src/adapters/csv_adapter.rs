//! CSV file data adapter: one `<ts_code>.csv` file per instrument.
//!
//! Files carry a header row using the `all_stocks_days` column names. Only
//! `trade_date` and `close` are required; other columns may be absent or empty.

use crate::domain::bar::{parse_trade_date, DailyBar};
use crate::domain::error::ScanError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    ts_code: Option<String>,
    trade_date: String,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
    #[serde(default)]
    pre_close: Option<f64>,
    #[serde(default)]
    pct_chg: Option<f64>,
    #[serde(default)]
    vol: Option<f64>,
    #[serde(default)]
    ma120: Option<f64>,
    #[serde(default)]
    ma250: Option<f64>,
    #[serde(default)]
    name: Option<String>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScanError> {
        let dir = config.require_string("csv", "dir")?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    fn read_rows(&self, code: &str) -> Result<Vec<CsvRow>, ScanError> {
        let path = self.csv_path(code);
        if !path.is_file() {
            return Err(ScanError::NoData {
                code: code.to_string(),
            });
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| ScanError::Database {
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;

        rdr.deserialize()
            .collect::<Result<Vec<CsvRow>, _>>()
            .map_err(|e| ScanError::MalformedData {
                code: code.to_string(),
                reason: format!("CSV parse error: {e}"),
            })
    }
}

impl DataPort for CsvAdapter {
    fn list_codes(&self) -> Result<Vec<String>, ScanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScanError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ScanError::Database {
                reason: format!("directory entry error: {e}"),
            })?;

            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<DailyBar>, ScanError> {
        let rows = self.read_rows(code)?;
        if rows.is_empty() {
            return Err(ScanError::NoData {
                code: code.to_string(),
            });
        }

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let trade_date =
                parse_trade_date(&row.trade_date).ok_or_else(|| ScanError::MalformedData {
                    code: code.to_string(),
                    reason: format!("bad trade_date '{}'", row.trade_date),
                })?;
            let close = row.close.ok_or_else(|| ScanError::MalformedData {
                code: code.to_string(),
                reason: format!("missing close on {trade_date}"),
            })?;

            bars.push(DailyBar {
                code: row
                    .ts_code
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| code.to_string()),
                trade_date,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close,
                pre_close: row.pre_close,
                pct_chg: row.pct_chg,
                vol: row.vol,
                ma120: row.ma120,
                ma250: row.ma250,
                name: row.name.unwrap_or_default(),
            });
        }

        bars.sort_by_key(|b| b.trade_date);
        Ok(bars)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScanError> {
        let bars = match self.fetch_bars(code) {
            Ok(bars) => bars,
            Err(ScanError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.trade_date, last.trade_date, bars.len()))),
            _ => Ok(None),
        }
    }
}
