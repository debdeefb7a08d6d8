//! Batch driver: run every instrument of the universe and assemble the snapshot.
//!
//! Instruments are processed strictly in universe order and the emitted windows
//! keep that order. A data failure on one instrument is logged and skipped; only
//! errors outside any single instrument (I/O, configuration) abort the batch.

use crate::domain::calendar::latest_trade_day_now;
use crate::domain::error::ScanError;
use crate::domain::instrument::{process_instrument, InstrumentStatus, ScoreRecord};
use crate::domain::scan_config::ScanConfig;
use crate::domain::snapshot::Snapshot;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct FailedInstrument {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub latest_day: NaiveDate,
    pub snapshot: Snapshot,
    /// Status of every instrument that was processed without error, in order.
    pub statuses: Vec<(String, InstrumentStatus)>,
    /// Score records in universe order.
    pub scores: Vec<ScoreRecord>,
    pub failures: Vec<FailedInstrument>,
}

impl BatchResult {
    pub fn processed(&self) -> usize {
        self.statuses.len()
    }

    pub fn leaderboard(&self, top: usize) -> Vec<&ScoreRecord> {
        leaderboard(&self.scores, top)
    }
}

/// Scores sorted by average return, best first. Ties keep universe order.
pub fn leaderboard(scores: &[ScoreRecord], top: usize) -> Vec<&ScoreRecord> {
    let mut ranked: Vec<&ScoreRecord> = scores.iter().collect();
    ranked.sort_by(|a, b| {
        b.avg_return
            .partial_cmp(&a.avg_return)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(top);
    ranked
}

/// The configured `as_of` date, or the latest settled session by the local clock.
pub fn resolve_latest_day(config: &ScanConfig) -> NaiveDate {
    config
        .as_of
        .unwrap_or_else(|| latest_trade_day_now(config.cutoff_hour))
}

pub fn run_batch(
    data_port: &dyn DataPort,
    codes: &[String],
    config: &ScanConfig,
    latest_day: NaiveDate,
) -> Result<BatchResult, ScanError> {
    let total = codes.len();
    let mut windows = Vec::new();
    let mut statuses = Vec::with_capacity(total);
    let mut scores = Vec::new();
    let mut failures = Vec::new();

    tracing::info!(instruments = total, %latest_day, inclusion = %config.inclusion, "starting scan");

    for (idx, code) in codes.iter().enumerate() {
        let outcome = data_port
            .fetch_bars(code)
            .and_then(|bars| process_instrument(code, bars, config, latest_day));

        let outcome = match outcome {
            Ok(o) => o,
            Err(e) if !e.is_per_instrument() => return Err(e),
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "skipping instrument");
                eprintln!("[{}/{}] {}: failed ({})", idx + 1, total, code, e);
                failures.push(FailedInstrument {
                    code: code.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        eprintln!("[{}/{}] {}: {}", idx + 1, total, code, outcome.status);
        if let Some(score) = &outcome.score {
            tracing::debug!(
                code = %code,
                buys = score.buy_signals,
                realized = score.realized_trades,
                "scored"
            );
            if outcome.window.is_some() {
                eprintln!("    avg return: {:.2}%", score.avg_return * 100.0);
            }
        }

        if let Some(window) = outcome.window {
            windows.push(window);
        }
        if let Some(score) = outcome.score {
            scores.push(score);
        }
        statuses.push((outcome.code, outcome.status));
    }

    let snapshot = Snapshot::new(windows);
    tracing::info!(
        emitted = snapshot.stock_count,
        failed = failures.len(),
        "scan finished"
    );

    Ok(BatchResult {
        latest_day,
        snapshot,
        statuses,
        scores,
        failures,
    })
}
