//! SQLite data adapter: a local mirror of the `all_stocks_days` table.

use crate::domain::bar::{format_trade_date, parse_trade_date, DailyBar};
use crate::domain::error::ScanError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

/// Row as stored; dates and nullable prices are resolved after the query.
struct StoredBar {
    code: String,
    trade_date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    pre_close: Option<f64>,
    pct_chg: Option<f64>,
    vol: Option<f64>,
    ma120: Option<f64>,
    ma250: Option<f64>,
    name: Option<String>,
}

impl StoredBar {
    fn into_bar(self) -> Result<DailyBar, ScanError> {
        let trade_date =
            parse_trade_date(&self.trade_date).ok_or_else(|| ScanError::MalformedData {
                code: self.code.clone(),
                reason: format!("bad trade_date '{}'", self.trade_date),
            })?;
        let close = self.close.ok_or_else(|| ScanError::MalformedData {
            code: self.code.clone(),
            reason: format!("missing close on {trade_date}"),
        })?;

        Ok(DailyBar {
            code: self.code,
            trade_date,
            open: self.open.unwrap_or(f64::NAN),
            high: self.high.unwrap_or(f64::NAN),
            low: self.low.unwrap_or(f64::NAN),
            close,
            pre_close: self.pre_close,
            pct_chg: self.pct_chg,
            vol: self.vol,
            ma120: self.ma120,
            ma250: self.ma250,
            name: self.name.unwrap_or_default(),
        })
    }
}

fn query_error(e: rusqlite::Error) -> ScanError {
    ScanError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ScanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4)?.max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| ScanError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ScanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ScanError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScanError> {
        self.pool.get().map_err(|e: r2d2::Error| ScanError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), ScanError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS all_stocks_days (
                    ts_code TEXT NOT NULL,
                    trade_date TEXT NOT NULL,
                    open REAL,
                    high REAL,
                    low REAL,
                    close REAL,
                    pre_close REAL,
                    pct_chg REAL,
                    vol REAL,
                    ma120 REAL,
                    ma250 REAL,
                    name TEXT,
                    PRIMARY KEY (ts_code, trade_date)
                );
                CREATE INDEX IF NOT EXISTS idx_all_stocks_days_date ON all_stocks_days(trade_date);",
            )
            .map_err(query_error)
    }

    pub fn insert_bars(&self, bars: &[DailyBar]) -> Result<(), ScanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO all_stocks_days
                    (ts_code, trade_date, open, high, low, close, pre_close, pct_chg,
                     vol, ma120, ma250, name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    bar.code,
                    format_trade_date(bar.trade_date),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.pre_close,
                    bar.pct_chg,
                    bar.vol,
                    bar.ma120,
                    bar.ma250,
                    bar.name
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }
}

impl DataPort for SqliteAdapter {
    fn list_codes(&self) -> Result<Vec<String>, ScanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ts_code FROM all_stocks_days ORDER BY ts_code")
            .map_err(query_error)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_error)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<DailyBar>, ScanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT ts_code, trade_date, open, high, low, close, pre_close, pct_chg,
                        vol, ma120, ma250, name
                 FROM all_stocks_days
                 WHERE ts_code = ?1
                 ORDER BY trade_date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![code], |row| {
                Ok(StoredBar {
                    code: row.get(0)?,
                    trade_date: row.get(1)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    pre_close: row.get(6)?,
                    pct_chg: row.get(7)?,
                    vol: row.get(8)?,
                    ma120: row.get(9)?,
                    ma250: row.get(10)?,
                    name: row.get(11)?,
                })
            })
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_error)?.into_bar()?);
        }

        if bars.is_empty() {
            return Err(ScanError::NoData {
                code: code.to_string(),
            });
        }
        Ok(bars)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScanError> {
        let query =
            "SELECT MIN(trade_date), MAX(trade_date), COUNT(*) FROM all_stocks_days WHERE ts_code = ?1";

        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(query, params![code], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let parse = |raw: &str| {
                    parse_trade_date(raw).ok_or_else(|| ScanError::MalformedData {
                        code: code.to_string(),
                        reason: format!("bad trade_date '{raw}'"),
                    })
                };
                Ok(Some((parse(&min_str)?, parse(&max_str)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
