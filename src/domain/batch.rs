//! Multi-symbol batch driver.
//!
//! Each symbol is an independent simulation run on a bounded rayon pool.
//! A symbol that errors or panics is recorded as skipped and never affects
//! the others. Results are ranked with signalling symbols first, then by
//! backtest return.

use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::info;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::MtfError;
use crate::domain::scoring::TrendState;
use crate::domain::simulation::{run_backtest, SymbolRecord, SymbolReport};
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::BarSource;
use crate::ports::observer_port::SignalObserver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoData,
    Failed(String),
    Panicked(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => f.write_str("no data"),
            SkipReason::Failed(reason) => write!(f, "failed: {reason}"),
            SkipReason::Panicked(reason) => write!(f, "panicked: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Ranked per-symbol reports.
    pub reports: Vec<SymbolReport>,
    /// Sorted by symbol.
    pub skipped: Vec<SymbolFailure>,
    /// Symbols simulated successfully but dropped by `signal_only`.
    pub filtered_out: usize,
}

impl BatchOutcome {
    pub fn records(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.reports.iter().map(|r| &r.record)
    }
}

/// Run every configured symbol, or every symbol the source knows when the
/// code list is empty.
pub fn run_batch(
    source: &dyn BarSource,
    backtest: &BacktestConfig,
    strategy: &StrategyConfig,
    observer: &dyn SignalObserver,
) -> Result<BatchOutcome, MtfError> {
    backtest.validate()?;
    strategy.validate()?;

    let symbols = if backtest.codes.is_empty() {
        source.list_symbols()?
    } else {
        backtest.codes.clone()
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(backtest.concurrency)
        .build()
        .map_err(|e| MtfError::WorkerPool {
            reason: e.to_string(),
        })?;

    info!(
        symbols = symbols.len(),
        concurrency = backtest.concurrency,
        start = %backtest.start_date,
        end = %backtest.end_date,
        "starting batch"
    );

    let results: Vec<Result<SymbolReport, SymbolFailure>> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| simulate_symbol(source, symbol, backtest, strategy, observer))
            .collect()
    });

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(report) => outcome.reports.push(report),
            Err(failure) => outcome.skipped.push(failure),
        }
    }

    if backtest.signal_only {
        let before = outcome.reports.len();
        outcome
            .reports
            .retain(|r| r.record.final_trend_state == TrendState::Uptrend);
        outcome.filtered_out = before - outcome.reports.len();
    }

    rank_reports(&mut outcome.reports);
    outcome.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    info!(
        completed = outcome.reports.len(),
        skipped = outcome.skipped.len(),
        filtered = outcome.filtered_out,
        "batch finished"
    );
    Ok(outcome)
}

fn simulate_symbol(
    source: &dyn BarSource,
    symbol: &str,
    backtest: &BacktestConfig,
    strategy: &StrategyConfig,
    observer: &dyn SignalObserver,
) -> Result<SymbolReport, SymbolFailure> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let bars = source.fetch_bars(symbol, backtest.start_date, backtest.end_date)?;
        run_backtest(symbol, bars, strategy, backtest, observer)
    }));

    let reason = match attempt {
        Ok(Ok(report)) => return Ok(report),
        Ok(Err(MtfError::NoData { .. })) => SkipReason::NoData,
        Ok(Err(e)) => SkipReason::Failed(e.to_string()),
        Err(payload) => SkipReason::Panicked(panic_message(payload.as_ref())),
    };

    observer.on_skipped(symbol, &reason);
    Err(SymbolFailure {
        symbol: symbol.to_string(),
        reason,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn has_signal(record: &SymbolRecord) -> bool {
    record.buy_signal || record.final_trend_state == TrendState::Uptrend
}

/// Signalling symbols first, then highest return, then symbol name.
pub fn rank_reports(reports: &mut [SymbolReport]) {
    reports.sort_by(|a, b| compare_records(&a.record, &b.record));
}

fn compare_records(a: &SymbolRecord, b: &SymbolRecord) -> Ordering {
    has_signal(b)
        .cmp(&has_signal(a))
        .then_with(|| b.backtest_return.total_cmp(&a.backtest_return))
        .then_with(|| a.symbol.cmp(&b.symbol))
}
