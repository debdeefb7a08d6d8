//! MACD indicator engine.
//!
//! - `MacdParams`: spans for the fast/slow EMA and the signal line
//! - `MacdPoint`: per-bar EMA pair, DIF, DEA, histogram and buy flag
//! - `IndicatorSeries`: the per-bar series for one instrument

pub mod ema;
pub mod macd;

use chrono::NaiveDate;
use std::fmt;

pub use macd::calculate_macd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
    }
}

impl fmt::Display for MacdParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MACD({},{},{})", self.fast, self.slow, self.signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub date: NaiveDate,
    pub ema_fast: f64,
    pub ema_slow: f64,
    /// Fast line: EMA(fast) - EMA(slow).
    pub dif: f64,
    /// Slow line: EMA(signal) of DIF.
    pub dea: f64,
    /// 2 * (DIF - DEA).
    pub histogram: f64,
    /// Golden cross: DIF moved above DEA on this bar.
    pub buy: bool,
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub params: MacdParams,
    pub points: Vec<MacdPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_buy(&self, index: usize) -> bool {
        self.points.get(index).is_some_and(|p| p.buy)
    }

    pub fn buy_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.buy)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn buy_flags(&self) -> Vec<bool> {
        self.points.iter().map(|p| p.buy).collect()
    }
}
