//! PostgreSQL data adapter for the `all_stocks_days` daily bar table.

use crate::domain::bar::{parse_trade_date, DailyBar};
use crate::domain::config_validation::validate_table_name;
use crate::domain::error::ScanError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use postgres::{Client, NoTls, Row};
use std::cell::RefCell;

pub const DEFAULT_TABLE: &str = "all_stocks_days";

pub struct PostgresAdapter {
    client: RefCell<Client>,
    table: String,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScanError> {
        let conninfo = config.require_string("database", "conninfo")?;

        let table = config
            .get_string("database", "table")
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&table)?;

        let client =
            Client::connect(&conninfo, NoTls).map_err(|e| ScanError::Database {
                reason: e.to_string(),
            })?;
        tracing::debug!(table = %table, "connected to postgres");

        Ok(Self {
            client: RefCell::new(client),
            table,
        })
    }

    fn query(
        &self,
        sql: &str,
        params: &[&(dyn postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Row>, ScanError> {
        self.client
            .borrow_mut()
            .query(sql, params)
            .map_err(|e| ScanError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}

/// One `all_stocks_days` row with every column nullable.
#[derive(Debug)]
struct RawRow {
    trade_date: Option<String>,
    prices: [Option<f64>; 9],
    name: Option<String>,
}

impl RawRow {
    /// Column order follows the `fetch_bars` select list; `ts_code` is not re-read.
    fn read(row: &Row) -> Result<Self, postgres::Error> {
        let mut prices = [None; 9];
        for (i, slot) in prices.iter_mut().enumerate() {
            *slot = row.try_get(i + 2)?;
        }
        Ok(Self {
            trade_date: row.try_get(1)?,
            prices,
            name: row.try_get(11)?,
        })
    }

    fn into_bar(self, code: &str) -> Result<DailyBar, ScanError> {
        let malformed = |reason: String| ScanError::MalformedData {
            code: code.to_string(),
            reason,
        };

        let raw_date = self
            .trade_date
            .ok_or_else(|| malformed("missing trade_date".to_string()))?;
        let trade_date = parse_trade_date(&raw_date)
            .ok_or_else(|| malformed(format!("bad trade_date '{raw_date}'")))?;
        let [open, high, low, close, pre_close, pct_chg, vol, ma120, ma250] = self.prices;
        let close = close.ok_or_else(|| malformed(format!("missing close on {trade_date}")))?;

        Ok(DailyBar {
            code: code.to_string(),
            trade_date,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close,
            pre_close,
            pct_chg,
            vol,
            ma120,
            ma250,
            name: self.name.unwrap_or_default(),
        })
    }
}

fn row_to_bar(code: &str, row: &Row) -> Result<DailyBar, ScanError> {
    RawRow::read(row)
        .map_err(|e| ScanError::MalformedData {
            code: code.to_string(),
            reason: e.to_string(),
        })?
        .into_bar(code)
}

impl DataPort for PostgresAdapter {
    fn list_codes(&self) -> Result<Vec<String>, ScanError> {
        let sql = format!(
            "SELECT DISTINCT ts_code FROM {} WHERE ts_code IS NOT NULL ORDER BY ts_code",
            self.table
        );
        let rows = self.query(&sql, &[])?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|e| ScanError::DatabaseQuery {
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<DailyBar>, ScanError> {
        let sql = format!(
            "SELECT ts_code, trade_date::text, \
                    open::double precision, high::double precision, \
                    low::double precision, close::double precision, \
                    pre_close::double precision, pct_chg::double precision, \
                    vol::double precision, ma120::double precision, \
                    ma250::double precision, name \
             FROM {} \
             WHERE ts_code = $1 \
             ORDER BY trade_date ASC",
            self.table
        );

        let rows = self.query(&sql, &[&code])?;
        if rows.is_empty() {
            return Err(ScanError::NoData {
                code: code.to_string(),
            });
        }
        rows.iter().map(|row| row_to_bar(code, row)).collect()
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScanError> {
        let sql = format!(
            "SELECT MIN(trade_date)::text, MAX(trade_date)::text, COUNT(*) FROM {} WHERE ts_code = $1",
            self.table
        );
        let rows = self.query(&sql, &[&code])?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let malformed = |e: postgres::Error| ScanError::MalformedData {
            code: code.to_string(),
            reason: e.to_string(),
        };
        let min: Option<String> = row.try_get(0).map_err(malformed)?;
        let max: Option<String> = row.try_get(1).map_err(malformed)?;
        let count: i64 = row.try_get(2).map_err(malformed)?;

        match (
            min.as_deref().and_then(parse_trade_date),
            max.as_deref().and_then(parse_trade_date),
        ) {
            (Some(first), Some(last)) if count > 0 => Ok(Some((first, last, count as usize))),
            _ => Ok(None),
        }
    }
}
