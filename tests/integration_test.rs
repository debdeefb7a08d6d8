//! Integration tests for the scan pipeline.
//!
//! Tests cover:
//! - Batch failure isolation and emission order
//! - Latest-day vs any-signal inclusion
//! - Leaderboard ordering and ties
//! - Snapshot publication through the JSON adapter
//! - Full scan via SqliteAdapter and CsvAdapter

mod common;

use common::*;
use macdscan::adapters::csv_adapter::CsvAdapter;
use macdscan::adapters::json_snapshot_adapter::JsonSnapshotAdapter;
use macdscan::domain::batch::{leaderboard, run_batch};
use macdscan::domain::error::ScanError;
use macdscan::domain::instrument::{analyze, InstrumentStatus, ScoreRecord};
use macdscan::domain::scan_config::{InclusionPolicy, ScanConfig};
use macdscan::domain::snapshot::COLUMN_NAMES;
use macdscan::domain::universe::resolve_universe;
use macdscan::ports::snapshot_port::SnapshotPort;
use serde_json::Value;

fn any_signal() -> ScanConfig {
    ScanConfig {
        inclusion: InclusionPolicy::AnySignal,
        ..ScanConfig::default()
    }
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

mod batch_isolation {
    use super::*;

    #[test]
    fn failing_instrument_is_skipped_and_order_kept() {
        let port = MockDataPort::new()
            .with_bars("A", v_shape_bars("A", 20))
            .with_error("B", "connection reset")
            .with_bars("C", v_shape_bars("C", 20));

        let result = run_batch(&port, &codes(&["A", "B", "C"]), &any_signal(), date(2025, 2, 19)).unwrap();

        assert_eq!(result.snapshot.stock_count, 2);
        assert_eq!(result.snapshot.data[0][0].ts_code, "A");
        assert_eq!(result.snapshot.data[1][0].ts_code, "C");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].code, "B");
        assert_eq!(result.processed(), 2);
    }

    #[test]
    fn malformed_and_missing_data_are_isolated() {
        let mut bad = v_shape_bars("BAD", 20);
        bad[3].trade_date = bad[2].trade_date;

        let port = MockDataPort::new()
            .with_bars("BAD", bad)
            .with_bars("EMPTY", vec![])
            .with_bars("OK", v_shape_bars("OK", 20));

        let result = run_batch(&port, &codes(&["BAD", "EMPTY", "OK"]), &any_signal(), date(2025, 2, 19)).unwrap();

        assert_eq!(result.snapshot.stock_count, 1);
        let failed: Vec<&str> = result.failures.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(failed, vec!["BAD", "EMPTY"]);
    }

    #[test]
    fn io_failure_aborts_batch() {
        let port = MockDataPort::new()
            .with_bars("A", v_shape_bars("A", 20))
            .with_io_error("B");

        let err = run_batch(&port, &codes(&["A", "B"]), &any_signal(), date(2025, 2, 19)).unwrap_err();
        assert!(matches!(err, ScanError::Io(_)));
    }

    #[test]
    fn short_and_flat_histories_are_not_emitted() {
        let port = MockDataPort::new()
            .with_bars("SHORT", flat_bars("SHORT", 10, 5.0))
            .with_bars("FLAT", flat_bars("FLAT", 60, 5.0))
            .with_bars("V", v_shape_bars("V", 20));

        let result = run_batch(&port, &codes(&["SHORT", "FLAT", "V"]), &any_signal(), date(2025, 2, 19)).unwrap();

        assert_eq!(result.snapshot.stock_count, 1);
        assert!(result.failures.is_empty());
        assert!(matches!(
            result.statuses[0].1,
            InstrumentStatus::InsufficientHistory { bars: 10, .. }
        ));
        assert_eq!(result.statuses[1].1, InstrumentStatus::NoSignal);
        assert_eq!(result.scores.len(), 1);
    }

    #[test]
    fn universe_limit_applies_before_batch() {
        let mut port = MockDataPort::new();
        for code in ["A", "B", "C", "D", "E", "F", "G"] {
            port = port.with_bars(code, v_shape_bars(code, 20));
        }
        let universe = resolve_universe(&port, None, Some(5)).unwrap();
        let result = run_batch(&port, &universe, &any_signal(), date(2025, 2, 19)).unwrap();
        assert_eq!(result.processed(), 5);
        assert_eq!(result.snapshot.data[4][0].ts_code, "E");
    }
}

mod inclusion_policy {
    use super::*;

    #[test]
    fn latest_signal_only_includes_buy_on_latest_day() {
        let bars = v_shape_bars("A", 20);
        let analysis = analyze("A", bars.clone(), &ScanConfig::default()).unwrap();
        let buy_day = bars[analysis.indicators.buy_indices()[0]].trade_date;

        let port = MockDataPort::new()
            .with_bars("A", bars)
            .with_bars("B", v_shape_bars("B", 25));
        let config = ScanConfig::default();

        let on_buy_day = run_batch(&port, &codes(&["A"]), &config, buy_day).unwrap();
        assert_eq!(on_buy_day.snapshot.stock_count, 1);
        let window = &on_buy_day.snapshot.data[0];
        assert_eq!(window.last().unwrap().trade_date, date(2025, 1, 1) + chrono::Duration::days(49));

        let later = run_batch(&port, &codes(&["A"]), &config, buy_day + chrono::Duration::days(3)).unwrap();
        assert_eq!(later.snapshot.stock_count, 0);
        assert!(matches!(later.statuses[0].1, InstrumentStatus::NotActive { .. }));
        assert_eq!(later.scores.len(), 1, "excluded instruments still get a score");
    }

    #[test]
    fn any_signal_includes_every_instrument_with_a_cross() {
        let port = MockDataPort::new()
            .with_bars("A", v_shape_bars("A", 20))
            .with_bars("B", v_shape_bars("B", 25));

        let result = run_batch(&port, &codes(&["A", "B"]), &any_signal(), date(2030, 1, 1)).unwrap();
        assert_eq!(result.snapshot.stock_count, 2);
        assert!(result.snapshot.data.iter().all(|w| w.len() == 20));
    }
}

mod ranking {
    use super::*;

    fn score(code: &str, avg_return: f64) -> ScoreRecord {
        ScoreRecord {
            code: code.into(),
            name: code.into(),
            avg_return,
            buy_signals: 2,
            realized_trades: 1,
        }
    }

    #[test]
    fn ties_keep_batch_order() {
        let scores = vec![
            score("A", 0.01),
            score("B", 0.05),
            score("C", 0.01),
            score("D", -0.03),
            score("E", 0.05),
        ];
        let ranked: Vec<&str> = leaderboard(&scores, 10).iter().map(|s| s.code.as_str()).collect();
        assert_eq!(ranked, vec!["B", "E", "A", "C", "D"]);
    }

    #[test]
    fn batch_scores_feed_leaderboard() {
        let port = MockDataPort::new()
            .with_bars("A", v_shape_bars("A", 20))
            .with_bars("B", v_shape_bars("B", 25))
            .with_bars("C", v_shape_bars("C", 30));

        let result = run_batch(&port, &codes(&["A", "B", "C"]), &any_signal(), date(2030, 1, 1)).unwrap();
        let top = result.leaderboard(2);
        assert_eq!(top.len(), 2);
        assert!(top[0].avg_return >= top[1].avg_return);
    }
}

mod snapshot_publication {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn published_file_matches_schema() {
        let port = MockDataPort::new()
            .with_bars("A", v_shape_bars("A", 20))
            .with_bars("B", flat_bars("B", 40, 3.0));
        let result = run_batch(&port, &codes(&["A", "B"]), &any_signal(), date(2030, 1, 1)).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macd_result.json");
        JsonSnapshotAdapter::new(&path).publish(&result.snapshot).unwrap();

        let parsed: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let names: Vec<&str> = parsed["column_names"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(names, COLUMN_NAMES.to_vec());
        assert_eq!(parsed["stock_count"], 1);

        let window = parsed["data"][0].as_array().unwrap();
        assert_eq!(window.len(), 20);
        let first = window[0].as_array().unwrap();
        assert_eq!(first[0], "A");
        assert!(first[1].as_str().unwrap().starts_with("2025-"));
        assert!(first[10].is_null(), "ma120 absent in source");
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_pipeline {
    use super::*;
    use macdscan::adapters::sqlite_adapter::SqliteAdapter;
    use macdscan::ports::data_port::DataPort;

    #[test]
    fn full_scan_with_seeded_database() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.insert_bars(&v_shape_bars("600519.SH", 20)).unwrap();
        adapter.insert_bars(&flat_bars("000001.SZ", 40, 11.0)).unwrap();

        let universe = resolve_universe(&adapter, None, None).unwrap();
        assert_eq!(universe, vec!["000001.SZ", "600519.SH"]);

        let result = run_batch(&adapter, &universe, &any_signal(), date(2030, 1, 1)).unwrap();
        assert_eq!(result.snapshot.stock_count, 1);
        assert_eq!(result.snapshot.data[0][0].ts_code, "600519.SH");

        let (first, last, count) = adapter.get_data_range("600519.SH").unwrap().unwrap();
        assert_eq!(first, date(2025, 1, 1));
        assert_eq!(last, date(2025, 2, 19));
        assert_eq!(count, 50);
    }
}

mod csv_pipeline {
    use super::*;
    use std::fmt::Write as _;
    use tempfile::TempDir;

    #[test]
    fn full_scan_from_csv_directory() {
        let dir = TempDir::new().unwrap();
        let mut content = String::from("ts_code,trade_date,open,high,low,close,pre_close,pct_chg,vol,ma120,ma250,name\n");
        for bar in v_shape_bars("300750.SZ", 20) {
            writeln!(
                content,
                "{},{},{},{},{},{},{},,{},,,宁德时代",
                bar.code,
                bar.trade_date.format("%Y%m%d"),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.pre_close.unwrap(),
                bar.vol.unwrap()
            )
            .unwrap();
        }
        std::fs::write(dir.path().join("300750.SZ.csv"), content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let universe = resolve_universe(&adapter, None, None).unwrap();
        let result = run_batch(&adapter, &universe, &any_signal(), date(2030, 1, 1)).unwrap();

        assert_eq!(result.snapshot.stock_count, 1);
        let row = &result.snapshot.data[0][0];
        assert_eq!(row.name, "宁德时代");
        assert_eq!(row.pct_chg, None);
        assert_eq!(result.scores[0].name, "宁德时代");
    }

    #[test]
    fn configured_codes_match_file_stems_exactly() {
        let dir = TempDir::new().unwrap();
        let mut content = String::from("trade_date,close\n");
        for bar in v_shape_bars("600519.sh", 20) {
            writeln!(content, "{},{}", bar.trade_date, bar.close).unwrap();
        }
        std::fs::write(dir.path().join("600519.sh.csv"), content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let universe = resolve_universe(&adapter, Some("600519.sh"), None).unwrap();
        assert_eq!(universe, codes(&["600519.sh"]));

        let result = run_batch(&adapter, &universe, &any_signal(), date(2030, 1, 1)).unwrap();
        assert!(result.failures.is_empty());
        assert_eq!(result.snapshot.stock_count, 1);
    }
}
