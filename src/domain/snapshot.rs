//! Snapshot output: the JSON document republished by the `/macd` route.
//!
//! ```text
//! { "column_names": [14 names], "data": [[row, ...], ...], "stock_count": n }
//! ```
//! Each row is an array in `COLUMN_NAMES` order. Non-finite numbers become `null`.

use crate::domain::bar::{format_trade_date, DailyBar};
use crate::domain::error::ScanError;
use chrono::NaiveDate;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

pub const COLUMN_NAMES: [&str; 14] = [
    "ts_code",
    "trade_date",
    "open",
    "high",
    "low",
    "close",
    "pre_close",
    "pct_chg",
    "vol",
    "bay",
    "ma120",
    "ma250",
    "name",
    "sell",
];

/// One emitted bar: the source columns plus `bay` and `sell`.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub ts_code: String,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub pre_close: Option<f64>,
    pub pct_chg: Option<f64>,
    pub vol: Option<f64>,
    /// Previous close on buy bars.
    pub bay: Option<f64>,
    pub ma120: Option<f64>,
    pub ma250: Option<f64>,
    pub name: String,
    /// Close of a bar that ends some trade.
    pub sell: Option<f64>,
    /// Whether `bay` applies; non-buy bars emit 0 for it.
    pub is_buy: bool,
}

impl SnapshotRow {
    pub fn from_bar(bar: &DailyBar, is_buy: bool, sell: Option<f64>) -> Self {
        Self {
            ts_code: bar.code.clone(),
            trade_date: bar.trade_date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            pre_close: bar.pre_close,
            pct_chg: bar.pct_chg,
            vol: bar.vol,
            bay: if is_buy { bar.pre_close } else { None },
            ma120: bar.ma120,
            ma250: bar.ma250,
            name: bar.name.clone(),
            sell,
            is_buy,
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn finite_opt(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl Serialize for SnapshotRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Wire format keeps the historical 0 for "not a buy bar" and "no exit here".
        let bay = if self.is_buy { finite_opt(self.bay) } else { Some(0.0) };
        let sell = finite_opt(self.sell).or(Some(0.0));

        let mut seq = serializer.serialize_seq(Some(COLUMN_NAMES.len()))?;
        seq.serialize_element(&self.ts_code)?;
        seq.serialize_element(&format_trade_date(self.trade_date))?;
        seq.serialize_element(&finite(self.open))?;
        seq.serialize_element(&finite(self.high))?;
        seq.serialize_element(&finite(self.low))?;
        seq.serialize_element(&finite(self.close))?;
        seq.serialize_element(&finite_opt(self.pre_close))?;
        seq.serialize_element(&finite_opt(self.pct_chg))?;
        seq.serialize_element(&finite_opt(self.vol))?;
        seq.serialize_element(&bay)?;
        seq.serialize_element(&finite_opt(self.ma120))?;
        seq.serialize_element(&finite_opt(self.ma250))?;
        seq.serialize_element(&self.name)?;
        seq.serialize_element(&sell)?;
        seq.end()
    }
}

/// Complete batch output. Built once in memory, then published whole.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub column_names: Vec<&'static str>,
    pub data: Vec<Vec<SnapshotRow>>,
    pub stock_count: usize,
}

impl Snapshot {
    pub fn new(data: Vec<Vec<SnapshotRow>>) -> Self {
        Self {
            column_names: COLUMN_NAMES.to_vec(),
            stock_count: data.len(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ScanError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
