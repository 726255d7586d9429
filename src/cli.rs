//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvBarSource;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::tracing_observer::TracingObserver;
use crate::domain::backtest::{BacktestConfig, DataSourceKind};
use crate::domain::batch::{run_batch, BatchOutcome};
use crate::domain::config_validation::{build_backtest_config, build_strategy_config};
use crate::domain::error::MtfError;
use crate::domain::simulation::{run_backtest, SymbolReport};
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::BarSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "mtftrader",
    about = "Multi-timeframe trend signal and position decision engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest a single symbol and print its trade log
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
    },
    /// Run every configured symbol and export the ranked records as CSV
    Batch {
        #[arg(short, long)]
        config: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep only symbols that end in an uptrend
        #[arg(long)]
        signal_only: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Copy the CSV directory into the SQLite bar cache
    Import {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest { config, code } => run_single(&config, &code),
        Command::Batch {
            config,
            output,
            signal_only,
        } => run_batch_command(&config, output.as_deref(), signal_only),
        Command::Validate { config } => run_validate(&config),
        Command::Import { config } => run_import(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate both configuration sections.
pub fn load_configs(path: &Path) -> Result<(FileConfigAdapter, BacktestConfig, StrategyConfig), MtfError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let backtest = build_backtest_config(&adapter)?;
    let strategy = build_strategy_config(&adapter)?;
    Ok((adapter, backtest, strategy))
}

/// Bar source selected by `[backtest] source`.
pub fn open_source(
    backtest: &BacktestConfig,
    config: &dyn ConfigPort,
) -> Result<Box<dyn BarSource>, MtfError> {
    match backtest.source {
        DataSourceKind::Csv => Ok(Box::new(CsvBarSource::new(backtest.data_dir.clone()))),
        DataSourceKind::Sqlite => open_sqlite(backtest, config).map(|s| Box::new(s) as Box<dyn BarSource>),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(
    backtest: &BacktestConfig,
    config: &dyn ConfigPort,
) -> Result<crate::adapters::sqlite_adapter::SqliteBarSource, MtfError> {
    let path = backtest
        .sqlite_path
        .as_deref()
        .ok_or_else(|| MtfError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        })?;
    let pool_size = match config.get_int("sqlite", "pool_size")? {
        Some(n) => parse_pool_size(n)?,
        None => u32::try_from(backtest.concurrency).unwrap_or(u32::MAX),
    };
    crate::adapters::sqlite_adapter::SqliteBarSource::from_path(path, pool_size)
}

#[cfg(feature = "sqlite")]
fn parse_pool_size(n: i64) -> Result<u32, MtfError> {
    match u32::try_from(n) {
        Ok(size) if size >= 1 => Ok(size),
        _ => Err(MtfError::ConfigInvalid {
            section: "sqlite".into(),
            key: "pool_size".into(),
            reason: format!("pool_size must be between 1 and {}", u32::MAX),
        }),
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(
    _backtest: &BacktestConfig,
    _config: &dyn ConfigPort,
) -> Result<CsvBarSource, MtfError> {
    Err(MtfError::ConfigInvalid {
        section: "backtest".into(),
        key: "source".into(),
        reason: "built without the sqlite feature".into(),
    })
}

fn run_single(config_path: &Path, code: &str) -> Result<(), MtfError> {
    info!(config = %config_path.display(), "loading config");
    let (adapter, backtest, strategy) = load_configs(config_path)?;
    let source = open_source(&backtest, &adapter)?;

    let symbol = code.trim().to_uppercase();
    let bars = source.fetch_bars(&symbol, backtest.start_date, backtest.end_date)?;
    info!(symbol = %symbol, bars = bars.len(), profile = %strategy.profile, "running backtest");

    let report = run_backtest(&symbol, bars, &strategy, &backtest, &TracingObserver)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SymbolReport) {
    let record = &report.record;
    println!("=== {} ===", record.symbol);
    for event in &report.events {
        println!(
            "{}  {:<12} qty {:>8}  @ {:>10.4}  score {:>4}  {}",
            event.date, event.action, event.quantity, event.price, event.score, event.trend
        );
    }
    if report.events.is_empty() {
        println!("(no trades)");
    }

    let m = &report.metrics;
    println!();
    println!("Final trend:      {}", record.final_trend_state);
    match record.latest_score {
        Some(score) => println!("Latest score:     {score}"),
        None => println!("Latest score:     undefined"),
    }
    println!("Buy signal:       {}", record.buy_signal);
    println!("Last close:       {:.4} on {}", record.last_price, record.last_date);
    println!("Total return:     {:.2}%", m.total_return * 100.0);
    println!("Max drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    println!("Trades:           {} ({} won, {} lost)", m.trade_count, m.trades_won, m.trades_lost);
    println!("Win rate:         {:.1}%", m.win_rate * 100.0);
    if report.skipped_bars > 0 {
        println!("Skipped bars:     {}", report.skipped_bars);
    }
}

fn run_batch_command(
    config_path: &Path,
    output: Option<&Path>,
    signal_only: bool,
) -> Result<(), MtfError> {
    info!(config = %config_path.display(), "loading config");
    let (adapter, mut backtest, strategy) = load_configs(config_path)?;
    backtest.signal_only |= signal_only;
    let source = open_source(&backtest, &adapter)?;

    let outcome = run_batch(source.as_ref(), &backtest, &strategy, &TracingObserver)?;
    report_skipped(&outcome);

    let report = CsvReportAdapter;
    match output {
        Some(path) => {
            report.write(&outcome, path)?;
            eprintln!("Results written to: {}", path.display());
        }
        None => report.write_records(&outcome, std::io::stdout().lock())?,
    }

    if outcome.reports.is_empty() && !outcome.skipped.is_empty() && outcome.filtered_out == 0 {
        return Err(MtfError::NoData {
            symbol: "any configured symbol".to_string(),
        });
    }
    Ok(())
}

fn report_skipped(outcome: &BatchOutcome) {
    if outcome.skipped.is_empty() {
        return;
    }
    eprintln!("Skipped {} symbol(s):", outcome.skipped.len());
    for failure in &outcome.skipped {
        eprintln!("  {}: {}", failure.symbol, failure.reason);
    }
}

fn run_validate(config_path: &Path) -> Result<(), MtfError> {
    eprintln!("Validating {}", config_path.display());
    let (_, backtest, strategy) = load_configs(config_path)?;

    eprintln!("\nBacktest:");
    eprintln!("  range:       {} to {}", backtest.start_date, backtest.end_date);
    eprintln!("  capital:     {:.2}", backtest.initial_capital);
    eprintln!("  commission:  {}%", backtest.commission_pct);
    eprintln!("  concurrency: {}", backtest.concurrency);
    if backtest.codes.is_empty() {
        eprintln!("  codes:       all symbols in source");
    } else {
        eprintln!("  codes:       {}", backtest.codes.join(", "));
    }

    eprintln!("\nStrategy ({}):", strategy.profile);
    eprintln!(
        "  MACD {}/{}/{}  KDJ {}  EMA {}",
        strategy.fast_period,
        strategy.slow_period,
        strategy.signal_period,
        strategy.kdj_period,
        strategy.ema_period
    );
    eprintln!(
        "  thresholds buy {} sell {}  weights {}/{}/{}",
        strategy.buy_threshold,
        strategy.sell_threshold,
        strategy.weights.monthly_macd,
        strategy.weights.weekly_kdj,
        strategy.weights.daily_ema
    );
    eprintln!(
        "  stop {}  target {}  size {}  partial exit {}",
        strategy.stop_loss_pct,
        strategy.take_profit_pct,
        strategy.position_size,
        strategy.downtrend_exit_size
    );

    eprintln!("\nConfiguration is valid");
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path) -> Result<(), MtfError> {
    use crate::adapters::sqlite_adapter::SqliteBarSource;

    let (_, backtest, _) = load_configs(config_path)?;
    let path = backtest
        .sqlite_path
        .as_deref()
        .ok_or_else(|| MtfError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        })?;

    let csv = CsvBarSource::new(backtest.data_dir.clone());
    let cache = SqliteBarSource::from_path(path, 1)?;
    let symbols = if backtest.codes.is_empty() {
        csv.list_symbols()?
    } else {
        backtest.codes.clone()
    };

    for symbol in &symbols {
        let bars = csv.fetch_bars(symbol, backtest.start_date, backtest.end_date)?;
        let written = cache.insert_bars(symbol, &bars)?;
        match cache.data_range(symbol)? {
            Some((first, last, count)) => {
                eprintln!("{symbol}: imported {written} bars, cache holds {count} ({first} to {last})")
            }
            None => eprintln!("{symbol}: no bars in range"),
        }
    }
    info!(symbols = symbols.len(), path = %path.display(), "import finished");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path) -> Result<(), MtfError> {
    Err(MtfError::ConfigInvalid {
        section: "sqlite".into(),
        key: "path".into(),
        reason: "built without the sqlite feature".into(),
    })
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn pool_size_must_fit_u32() {
        assert_eq!(parse_pool_size(4).unwrap(), 4);
        assert!(matches!(
            parse_pool_size(0).unwrap_err(),
            MtfError::ConfigInvalid { key, .. } if key == "pool_size"
        ));
        assert!(parse_pool_size(-1).is_err());
        assert!(parse_pool_size(i64::from(u32::MAX) + 1).is_err());
    }
}
