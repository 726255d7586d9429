//! Backtest run parameters.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::error::MtfError;
use crate::domain::ledger::{DEFAULT_COMMISSION_PCT, DEFAULT_INITIAL_CAPITAL};

const SECTION: &str = "backtest";

/// Where daily bars are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSourceKind {
    #[default]
    Csv,
    Sqlite,
}

impl FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(DataSourceKind::Csv),
            "sqlite" => Ok(DataSourceKind::Sqlite),
            other => Err(format!("unknown source '{}', expected csv or sqlite", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Percent of traded value charged on each fill.
    pub commission_pct: f64,
    pub codes: Vec<String>,
    pub source: DataSourceKind,
    pub data_dir: PathBuf,
    pub sqlite_path: Option<PathBuf>,
    /// Maximum number of symbols simulated at once.
    pub concurrency: usize,
    pub signal_only: bool,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, codes: Vec<String>) -> Self {
        BacktestConfig {
            start_date,
            end_date,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission_pct: DEFAULT_COMMISSION_PCT,
            codes,
            source: DataSourceKind::Csv,
            data_dir: PathBuf::from("data"),
            sqlite_path: None,
            concurrency: default_concurrency(),
            signal_only: false,
        }
    }

    pub fn validate(&self) -> Result<(), MtfError> {
        if self.start_date >= self.end_date {
            return Err(MtfError::invalid(
                SECTION,
                "start_date",
                "start_date must be before end_date",
            ));
        }
        if !(self.initial_capital > 0.0 && self.initial_capital.is_finite()) {
            return Err(MtfError::invalid(
                SECTION,
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if !(self.commission_pct >= 0.0 && self.commission_pct < 100.0) {
            return Err(MtfError::invalid(
                SECTION,
                "commission_pct",
                "commission_pct must be in [0, 100)",
            ));
        }
        if self.concurrency == 0 {
            return Err(MtfError::invalid(
                SECTION,
                "concurrency",
                "concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
