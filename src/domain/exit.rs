//! Take-profit / stop-loss exit simulation.
//!
//! Each buy signal gets its own forward scan over the closes that follow it. The
//! first bar whose return from the buy close reaches the profit threshold or falls
//! to the loss threshold is that trade's exit; nothing after it is examined.
//! Overlapping buy signals are scanned independently over the same bars.

use crate::domain::bar::DailyBar;
use chrono::NaiveDate;

pub const DEFAULT_PROFIT_THRESHOLD: f64 = 0.05;
pub const DEFAULT_LOSS_THRESHOLD: f64 = -0.03;

/// Fractional return bounds relative to the buy close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitThresholds {
    pub profit: f64,
    pub loss: f64,
}

impl Default for ExitThresholds {
    fn default() -> Self {
        Self {
            profit: DEFAULT_PROFIT_THRESHOLD,
            loss: DEFAULT_LOSS_THRESHOLD,
        }
    }
}

impl ExitThresholds {
    pub fn is_breached(&self, ret: f64) -> bool {
        ret >= self.profit || ret <= self.loss
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub ret: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub buy_index: usize,
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    /// `None` when no later close ever crossed either threshold.
    pub exit: Option<Exit>,
}

#[derive(Debug, Clone, Default)]
pub struct ExitSimulation {
    pub trades: Vec<Trade>,
    /// Parallel to the bar series: the close of every bar that ends some trade.
    pub sell: Vec<Option<f64>>,
}

impl ExitSimulation {
    pub fn realized_returns(&self) -> impl Iterator<Item = f64> + '_ {
        self.trades.iter().filter_map(|t| t.exit.map(|e| e.ret))
    }

    pub fn realized_count(&self) -> usize {
        self.realized_returns().count()
    }

    /// Mean realized return rounded to 4 decimals; 0.0 with no realized exits.
    /// Open trades are excluded, not counted as zero.
    pub fn average_return(&self) -> f64 {
        let (sum, n) = self
            .realized_returns()
            .fold((0.0, 0usize), |(s, n), r| (s + r, n + 1));
        if n == 0 {
            0.0
        } else {
            round4(sum / n as f64)
        }
    }
}

/// Rounds to 4 decimals. Negative values that round to zero come back as `0.0`.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0 + 0.0
}

/// Simulate exits for every flagged buy bar.
///
/// `buys` is parallel to `bars`; both must be in ascending trade-date order.
pub fn simulate_exits(
    bars: &[DailyBar],
    buys: &[bool],
    thresholds: ExitThresholds,
) -> ExitSimulation {
    let mut sell = vec![None; bars.len()];
    let mut trades = Vec::new();

    for (buy_index, _) in buys.iter().enumerate().filter(|(_, b)| **b) {
        let Some(buy_bar) = bars.get(buy_index) else {
            break;
        };
        let buy_price = buy_bar.close;

        let exit = bars
            .iter()
            .enumerate()
            .skip(buy_index + 1)
            .map(|(i, bar)| (i, bar, (bar.close - buy_price) / buy_price))
            .find(|&(_, _, ret)| thresholds.is_breached(ret))
            .map(|(index, bar, ret)| Exit {
                index,
                date: bar.trade_date,
                price: bar.close,
                ret,
            });

        if let Some(e) = exit {
            sell[e.index] = Some(e.price);
        }

        trades.push(Trade {
            buy_index,
            buy_date: buy_bar.trade_date,
            buy_price,
            exit,
        });
    }

    ExitSimulation { trades, sell }
}
