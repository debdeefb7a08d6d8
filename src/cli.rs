//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_snapshot_adapter::JsonSnapshotAdapter;
use crate::adapters::open_data_port;
use crate::domain::bar::parse_trade_date;
use crate::domain::batch::{resolve_latest_day, run_batch, BatchResult};
use crate::domain::config_validation::{validate_scan_config, validate_source_config};
use crate::domain::error::ScanError;
use crate::domain::instrument::analyze;
use crate::domain::scan_config::{InclusionPolicy, ScanConfig};
use crate::domain::universe::resolve_universe;
use crate::ports::config_port::ConfigPort;
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Parser, Debug)]
#[command(name = "macdscan", about = "MACD golden-cross scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the universe and publish the snapshot
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Snapshot path (overrides [scan] output)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated codes (overrides [scan] codes)
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Latest trading day, YYYY-MM-DD or YYYYMMDD
        #[arg(long)]
        as_of: Option<String>,
        /// latest | any
        #[arg(long)]
        inclusion: Option<String>,
        #[arg(long)]
        top: Option<usize>,
    },
    /// List every buy signal and its exit for one instrument
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
    },
    /// List the instrument universe
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for instrument(s)
    Info {
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Serve the latest snapshot over HTTP
    Serve {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        listen: Option<String>,
    },
}

/// Command-line values that take precedence over the `[scan]` section.
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub output: Option<PathBuf>,
    pub codes: Option<String>,
    pub limit: Option<usize>,
    pub as_of: Option<String>,
    pub inclusion: Option<String>,
    pub top: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Scan {
            config,
            output,
            code,
            limit,
            as_of,
            inclusion,
            top,
        } => run_scan(
            &config,
            &ScanOverrides {
                output,
                codes: code,
                limit,
                as_of,
                inclusion,
                top,
            },
        ),
        Command::Signals { config, code } => run_signals(&config, &code),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { code, config } => run_info(code.as_deref(), &config),
        Command::Validate { config } => run_validate(&config),
        Command::Serve { config, listen } => run_serve(&config, listen.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = ScanError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: ScanError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Validate the file, read `[scan]` and apply command-line overrides.
pub fn build_scan_config(
    config: &dyn ConfigPort,
    overrides: &ScanOverrides,
) -> Result<ScanConfig, ScanError> {
    validate_scan_config(config)?;
    let mut scan = ScanConfig::from_config(config)?;

    if let Some(output) = &overrides.output {
        scan.output = output.clone();
    }
    if let Some(limit) = overrides.limit {
        scan.limit = (limit > 0).then_some(limit);
    }
    if let Some(raw) = &overrides.as_of {
        scan.as_of = Some(parse_trade_date(raw).ok_or_else(|| ScanError::ConfigInvalid {
            section: "scan".into(),
            key: "as_of".into(),
            reason: format!("'{raw}' is not YYYY-MM-DD or YYYYMMDD"),
        })?);
    }
    if let Some(raw) = &overrides.inclusion {
        scan.inclusion =
            raw.parse::<InclusionPolicy>()
                .map_err(|reason| ScanError::ConfigInvalid {
                    section: "scan".into(),
                    key: "inclusion".into(),
                    reason,
                })?;
    }
    if let Some(top) = overrides.top {
        if top == 0 {
            return Err(ScanError::ConfigInvalid {
                section: "scan".into(),
                key: "top".into(),
                reason: "top must be at least 1".into(),
            });
        }
        scan.top = top;
    }

    Ok(scan)
}

fn run_scan(config_path: &PathBuf, overrides: &ScanOverrides) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let scan = match build_scan_config(&adapter, overrides) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    if let Err(e) = validate_source_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Open the data source once for the whole batch
    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    // Stage 3: Universe
    let configured = overrides
        .codes
        .clone()
        .or_else(|| adapter.get_string("scan", "codes"));
    let codes = match resolve_universe(data_port.as_ref(), configured.as_deref(), scan.limit) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let latest_day = resolve_latest_day(&scan);
    eprintln!(
        "Scanning {} instruments ({}, {} inclusion, latest trading day {})",
        codes.len(),
        scan.macd,
        scan.inclusion,
        latest_day
    );

    // Stage 4: Batch
    let result = match run_batch(data_port.as_ref(), &codes, &scan, latest_day) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 5: Publish
    let sink = JsonSnapshotAdapter::new(&scan.output);
    if let Err(e) = sink.publish(&result.snapshot) {
        return fail(e);
    }

    print_summary(&result, scan.top);
    eprintln!("\nSnapshot written to: {}", sink.path().display());
    ExitCode::SUCCESS
}

fn print_summary(result: &BatchResult, top: usize) {
    eprintln!("\n=== Scan Summary ===");
    eprintln!("Latest trading day: {}", result.latest_day);
    eprintln!("Processed:          {}", result.processed());
    eprintln!("Emitted:            {}", result.snapshot.stock_count);
    eprintln!("Scored:             {}", result.scores.len());
    eprintln!("Failed:             {}", result.failures.len());

    let ranked = result.leaderboard(top);
    if !ranked.is_empty() {
        eprintln!("\n=== Top {} by Average Return ===", ranked.len());
        for (rank, score) in ranked.iter().enumerate() {
            eprintln!(
                "{:>3}. {:<12} {:<10} {:>8.2}%  buys {:>3}  realized {:>3}",
                rank + 1,
                score.code,
                score.name,
                score.avg_return * 100.0,
                score.buy_signals,
                score.realized_trades
            );
        }
    }

    if !result.failures.is_empty() {
        eprintln!("\n=== Skipped ===");
        for failure in &result.failures {
            eprintln!("  {}: {}", failure.code, failure.reason);
        }
    }
}

fn run_signals(config_path: &PathBuf, code: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let scan = match build_scan_config(&adapter, &ScanOverrides::default()) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let code = code.trim().to_string();
    let analysis = match data_port
        .fetch_bars(&code)
        .and_then(|bars| analyze(&code, bars, &scan))
    {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if analysis.exits.trades.is_empty() {
        eprintln!("{code}: no buy signals in {} bars", analysis.bars.len());
        return ExitCode::SUCCESS;
    }

    for trade in &analysis.exits.trades {
        match &trade.exit {
            Some(exit) => println!(
                "{}  buy {:.2}  ->  {}  sell {:.2}  {:+.2}%",
                trade.buy_date,
                trade.buy_price,
                exit.date,
                exit.price,
                exit.ret * 100.0
            ),
            None => println!("{}  buy {:.2}  ->  open", trade.buy_date, trade.buy_price),
        }
    }

    let score = analysis.score(&code);
    eprintln!(
        "{}: {} signals, {} realized, average return {:.2}%",
        code,
        score.buy_signals,
        score.realized_trades,
        score.avg_return * 100.0
    );
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let codes = match data_port.list_codes() {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    if codes.is_empty() {
        eprintln!("No symbols found");
    } else {
        for code in &codes {
            println!("{}", code);
        }
        eprintln!("{} symbols found", codes.len());
    }
    ExitCode::SUCCESS
}

fn run_info(code: Option<&str>, config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let configured = code
        .map(str::to_string)
        .or_else(|| config.get_string("scan", "codes"));
    let codes = match resolve_universe(data_port.as_ref(), configured.as_deref(), None) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    for c in &codes {
        match data_port.get_data_range(c) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", c, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", c);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", c, e);
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let source = match validate_source_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let scan = match build_scan_config(&adapter, &ScanOverrides::default()) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("\nData source:      {:?}", source);
    eprintln!("Indicator:        {}", scan.macd);
    eprintln!(
        "Exit thresholds:  +{:.2}% / {:.2}%",
        scan.thresholds.profit * 100.0,
        scan.thresholds.loss * 100.0
    );
    eprintln!("Min history:      {} bars", scan.min_history);
    eprintln!("Window size:      {} bars", scan.window_size);
    eprintln!("Inclusion:        {}", scan.inclusion);
    match scan.as_of {
        Some(day) => eprintln!("Latest day:       {} (pinned)", day),
        None => eprintln!("Latest day:       clock, cutoff {}:00", scan.cutoff_hour),
    }
    eprintln!("Output:           {}", scan.output.display());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf, listen: Option<&str>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{serve, AppState, DEFAULT_LISTEN};

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let listen = listen
            .map(str::to_string)
            .or_else(|| config.get_string("web", "listen"))
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let state = AppState::from_config(&config);

        eprintln!("Starting web server on {}", listen);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return fail(e.into()),
        };
        match runtime.block_on(serve(&listen, state)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config_path, listen);
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
