//! Per-instrument pipeline: indicators, exits, inclusion and the emitted window.

use crate::domain::bar::{sort_and_check, DailyBar};
use crate::domain::error::ScanError;
use crate::domain::exit::{simulate_exits, ExitSimulation};
use crate::domain::indicator::{calculate_macd, IndicatorSeries};
use crate::domain::scan_config::{InclusionPolicy, ScanConfig};
use crate::domain::snapshot::SnapshotRow;
use chrono::NaiveDate;
use std::fmt;

/// Aggregate trade statistics for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub code: String,
    pub name: String,
    /// Mean realized return over trades that exited, rounded to 4 places.
    pub avg_return: f64,
    pub buy_signals: usize,
    pub realized_trades: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentStatus {
    Included,
    InsufficientHistory { bars: usize, minimum: usize },
    NoSignal,
    /// Has buy signals, but none on the latest resolved trading day.
    NotActive { latest_day: NaiveDate },
}

impl fmt::Display for InstrumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Included => write!(f, "included"),
            Self::InsufficientHistory { bars, minimum } => {
                write!(f, "skipped (only {bars} bars, minimum {minimum})")
            }
            Self::NoSignal => write!(f, "excluded (no buy signal)"),
            Self::NotActive { latest_day } => {
                write!(f, "excluded (no buy signal on {latest_day})")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentOutcome {
    pub code: String,
    pub status: InstrumentStatus,
    /// Most recent bars in ascending date order; `None` omits the instrument.
    pub window: Option<Vec<SnapshotRow>>,
    /// Present whenever the instrument produced at least one buy signal.
    pub score: Option<ScoreRecord>,
}

/// Indicator and exit results for one validated, date-ordered series.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub bars: Vec<DailyBar>,
    pub indicators: IndicatorSeries,
    pub exits: ExitSimulation,
}

impl Analysis {
    pub fn buy_count(&self) -> usize {
        self.exits.trades.len()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.trade_date).ok()
    }

    pub fn rows(&self) -> Vec<SnapshotRow> {
        self.bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                SnapshotRow::from_bar(bar, self.indicators.is_buy(i), self.exits.sell[i])
            })
            .collect()
    }

    pub fn score(&self, code: &str) -> ScoreRecord {
        ScoreRecord {
            code: code.to_string(),
            name: self.bars.last().map(|b| b.name.clone()).unwrap_or_default(),
            avg_return: self.exits.average_return(),
            buy_signals: self.buy_count(),
            realized_trades: self.exits.realized_count(),
        }
    }
}

/// Order, validate and run indicators plus the exit simulation.
pub fn analyze(
    code: &str,
    mut bars: Vec<DailyBar>,
    config: &ScanConfig,
) -> Result<Analysis, ScanError> {
    sort_and_check(&mut bars).map_err(|date| ScanError::MalformedData {
        code: code.to_string(),
        reason: format!("duplicate trade date {date}"),
    })?;

    if let Some(bad) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
        return Err(ScanError::MalformedData {
            code: code.to_string(),
            reason: format!("invalid close {} on {}", bad.close, bad.trade_date),
        });
    }

    let indicators = calculate_macd(&bars, config.macd);
    let exits = simulate_exits(&bars, &indicators.buy_flags(), config.thresholds);

    Ok(Analysis {
        bars,
        indicators,
        exits,
    })
}

/// Run the full per-instrument pipeline against `latest_day`.
///
/// Too-short histories and instruments without a qualifying signal are normal
/// outcomes, not errors. Errors mean the data itself is unusable.
pub fn process_instrument(
    code: &str,
    bars: Vec<DailyBar>,
    config: &ScanConfig,
    latest_day: NaiveDate,
) -> Result<InstrumentOutcome, ScanError> {
    if bars.len() < config.min_history {
        return Ok(InstrumentOutcome {
            code: code.to_string(),
            status: InstrumentStatus::InsufficientHistory {
                bars: bars.len(),
                minimum: config.min_history,
            },
            window: None,
            score: None,
        });
    }

    let analysis = analyze(code, bars, config)?;

    if analysis.buy_count() == 0 {
        return Ok(InstrumentOutcome {
            code: code.to_string(),
            status: InstrumentStatus::NoSignal,
            window: None,
            score: None,
        });
    }

    let score = analysis.score(code);

    let active = match config.inclusion {
        InclusionPolicy::AnySignal => true,
        InclusionPolicy::LatestSignal => analysis
            .index_of(latest_day)
            .is_some_and(|i| analysis.indicators.is_buy(i)),
    };

    if !active {
        return Ok(InstrumentOutcome {
            code: code.to_string(),
            status: InstrumentStatus::NotActive { latest_day },
            window: None,
            score: Some(score),
        });
    }

    let rows = analysis.rows();
    let start = rows.len().saturating_sub(config.window_size);

    Ok(InstrumentOutcome {
        code: code.to_string(),
        status: InstrumentStatus::Included,
        window: Some(rows[start..].to_vec()),
        score: Some(score),
    })
}
