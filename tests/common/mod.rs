#![allow(dead_code)]

use chrono::NaiveDate;
pub use macdscan::domain::bar::DailyBar;
use macdscan::domain::error::ScanError;
use macdscan::ports::data_port::DataPort;
use std::collections::HashMap;

/// In-memory data source. `list_codes` returns codes in insertion order.
pub struct MockDataPort {
    pub order: Vec<String>,
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
    pub io_errors: Vec<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            data: HashMap::new(),
            errors: HashMap::new(),
            io_errors: Vec::new(),
        }
    }

    fn track(&mut self, code: &str) {
        if !self.order.iter().any(|c| c == code) {
            self.order.push(code.to_string());
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<DailyBar>) -> Self {
        self.track(code);
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.track(code);
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    /// A failure that is not about the instrument's data.
    pub fn with_io_error(mut self, code: &str) -> Self {
        self.track(code);
        self.io_errors.push(code.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn list_codes(&self) -> Result<Vec<String>, ScanError> {
        Ok(self.order.clone())
    }

    fn fetch_bars(&self, code: &str) -> Result<Vec<DailyBar>, ScanError> {
        if self.io_errors.iter().any(|c| c == code) {
            return Err(ScanError::Io(std::io::Error::other("disk gone")));
        }
        if let Some(reason) = self.errors.get(code) {
            return Err(ScanError::DatabaseQuery {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => Ok(bars.clone()),
            _ => Err(ScanError::NoData {
                code: code.to_string(),
            }),
        }
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScanError> {
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.trade_date).min().unwrap();
                let max = bars.iter().map(|b| b.trade_date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, trade_date: NaiveDate, close: f64, pre_close: f64) -> DailyBar {
    DailyBar {
        code: code.to_string(),
        trade_date,
        open: pre_close,
        high: close.max(pre_close) + 0.1,
        low: close.min(pre_close) - 0.1,
        close,
        pre_close: Some(pre_close),
        pct_chg: Some((close / pre_close - 1.0) * 100.0),
        vol: Some(10_000.0),
        ma120: None,
        ma250: None,
        name: format!("{code} Corp"),
    }
}

/// Consecutive calendar days starting at `start`, one bar per close.
pub fn bars_from_closes(code: &str, start: NaiveDate, closes: &[f64]) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let pre_close = if i == 0 { close } else { closes[i - 1] };
            make_bar(code, start + chrono::Duration::days(i as i64), close, pre_close)
        })
        .collect()
}

pub fn flat_bars(code: &str, count: usize, price: f64) -> Vec<DailyBar> {
    bars_from_closes(code, date(2025, 1, 1), &vec![price; count])
}

/// Thirty falling closes followed by a `rally`-bar climb: one golden cross after the turn.
pub fn v_shape_closes(rally: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
    closes.extend((1..=rally).map(|i| 71.0 + 2.0 * i as f64));
    closes
}

pub fn v_shape_bars(code: &str, rally: usize) -> Vec<DailyBar> {
    bars_from_closes(code, date(2025, 1, 1), &v_shape_closes(rally))
}
