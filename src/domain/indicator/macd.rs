//! MACD (Moving Average Convergence Divergence).
//!
//! DIF = EMA(fast) - EMA(slow) of close
//! DEA = EMA(signal) of DIF
//! Histogram = 2 * (DIF - DEA)
//! Buy on bar i iff DIF[i] > DEA[i] and DIF[i-1] <= DEA[i-1]; never on bar 0.
//!
//! All EMAs are seeded with their first input, so the output is defined from the
//! first bar. Early values are unstable; callers enforce a minimum history.

use crate::domain::bar::DailyBar;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::{IndicatorSeries, MacdParams, MacdPoint};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// Compute the MACD series for one instrument.
///
/// Points come back in ascending trade-date order. Input that is already sorted
/// (the normal case) therefore lines up index-for-index with the output.
pub fn calculate_macd(bars: &[DailyBar], params: MacdParams) -> IndicatorSeries {
    if bars.is_empty() || params.fast == 0 || params.slow == 0 || params.signal == 0 {
        return IndicatorSeries {
            params,
            points: Vec::new(),
        };
    }

    let mut order: Vec<usize> = (0..bars.len()).collect();
    if !bars.is_sorted_by_key(|b| b.trade_date) {
        order.sort_by_key(|&i| bars[i].trade_date);
    }

    let closes: Vec<f64> = order.iter().map(|&i| bars[i].close).collect();
    let ema_fast = calculate_ema(&closes, params.fast);
    let ema_slow = calculate_ema(&closes, params.slow);
    let dif: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let dea = calculate_ema(&dif, params.signal);

    let points = order
        .iter()
        .enumerate()
        .map(|(i, &src)| MacdPoint {
            date: bars[src].trade_date,
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            dif: dif[i],
            dea: dea[i],
            histogram: 2.0 * (dif[i] - dea[i]),
            buy: i > 0 && dif[i] > dea[i] && dif[i - 1] <= dea[i - 1],
        })
        .collect();

    IndicatorSeries { params, points }
}
