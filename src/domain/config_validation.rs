//! Configuration loading and validation.
//!
//! Builds immutable [`BacktestConfig`] and [`StrategyConfig`] values from a
//! [`ConfigPort`], applying defaults for absent keys and rejecting invalid
//! ones before any simulation runs.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::backtest::{default_concurrency, BacktestConfig, DataSourceKind};
use crate::domain::error::MtfError;
use crate::domain::ledger::{DEFAULT_COMMISSION_PCT, DEFAULT_INITIAL_CAPITAL};
use crate::domain::strategy::{ScoreWeights, ScoringProfile, StrategyConfig};
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const STRATEGY: &str = "strategy";
const SQLITE: &str = "sqlite";

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, MtfError> {
    let (start_date, end_date) = parse_dates(config)?;

    let initial_capital = config
        .get_double(BACKTEST, "initial_capital")?
        .unwrap_or(DEFAULT_INITIAL_CAPITAL);
    let commission_pct = config
        .get_double(BACKTEST, "commission_pct")?
        .unwrap_or(DEFAULT_COMMISSION_PCT);

    let concurrency = match config.get_int(BACKTEST, "concurrency")? {
        None => default_concurrency(),
        Some(n) if n >= 1 => n as usize,
        Some(_) => {
            return Err(MtfError::invalid(
                BACKTEST,
                "concurrency",
                "concurrency must be at least 1",
            ));
        }
    };

    let source = match config.get_string(BACKTEST, "source") {
        None => DataSourceKind::Csv,
        Some(s) => s
            .parse()
            .map_err(|reason: String| MtfError::invalid(BACKTEST, "source", reason))?,
    };
    let sqlite_path = config.get_string(SQLITE, "path").map(PathBuf::from);
    if source == DataSourceKind::Sqlite && sqlite_path.is_none() {
        return Err(MtfError::ConfigMissing {
            section: SQLITE.to_string(),
            key: "path".to_string(),
        });
    }

    let codes = match config
        .get_string(BACKTEST, "codes")
        .or_else(|| config.get_string(BACKTEST, "code"))
    {
        Some(list) => parse_codes(&list)?,
        None => Vec::new(),
    };

    let backtest = BacktestConfig {
        start_date,
        end_date,
        initial_capital,
        commission_pct,
        codes,
        source,
        data_dir: config
            .get_string(BACKTEST, "data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data")),
        sqlite_path,
        concurrency,
        signal_only: config.get_bool(BACKTEST, "signal_only")?.unwrap_or(false),
    };
    backtest.validate()?;
    Ok(backtest)
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, MtfError> {
    let defaults = StrategyConfig::default();

    let profile = match config.get_string(STRATEGY, "profile") {
        None => defaults.profile,
        Some(s) => s
            .parse::<ScoringProfile>()
            .map_err(|reason| MtfError::invalid(STRATEGY, "profile", reason))?,
    };

    let strategy = StrategyConfig {
        profile,
        fast_period: period(config, "fast_period", defaults.fast_period)?,
        slow_period: period(config, "slow_period", defaults.slow_period)?,
        signal_period: period(config, "signal_period", defaults.signal_period)?,
        kdj_period: period(config, "kdj_period", defaults.kdj_period)?,
        ema_period: period(config, "ema_period", defaults.ema_period)?,
        position_size: double(config, "position_size", defaults.position_size)?,
        stop_loss_pct: double(config, "stop_loss_pct", defaults.stop_loss_pct)?,
        take_profit_pct: double(config, "take_profit_pct", defaults.take_profit_pct)?,
        downtrend_exit_size: double(config, "downtrend_exit_size", defaults.downtrend_exit_size)?,
        buy_threshold: points(config, "buy_threshold", defaults.buy_threshold)?,
        sell_threshold: points(config, "sell_threshold", defaults.sell_threshold)?,
        monthly_macd_threshold: double(
            config,
            "monthly_macd_threshold",
            defaults.monthly_macd_threshold,
        )?,
        weights: ScoreWeights {
            monthly_macd: points(config, "monthly_macd_weight", defaults.weights.monthly_macd)?,
            weekly_kdj: points(config, "weekly_kdj_weight", defaults.weights.weekly_kdj)?,
            daily_ema: points(config, "daily_ema_weight", defaults.weights.daily_ema)?,
        },
    };
    strategy.validate()?;
    Ok(strategy)
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MtfError> {
    match config.get_int(STRATEGY, key)? {
        None => Ok(default),
        Some(n) => usize::try_from(n)
            .map_err(|_| MtfError::invalid(STRATEGY, key, "period must be non-negative")),
    }
}

fn points(config: &dyn ConfigPort, key: &str, default: i32) -> Result<i32, MtfError> {
    match config.get_int(STRATEGY, key)? {
        None => Ok(default),
        Some(n) => i32::try_from(n).map_err(|_| MtfError::invalid(STRATEGY, key, "out of range")),
    }
}

fn double(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, MtfError> {
    Ok(config.get_double(STRATEGY, key)?.unwrap_or(default))
}

fn parse_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), MtfError> {
    let start_str = config.get_string(BACKTEST, "start_date");
    let end_str = config.get_string(BACKTEST, "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    Ok((start_date, end_date))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MtfError> {
    match value {
        None => Err(MtfError::ConfigMissing {
            section: BACKTEST.to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            MtfError::invalid(
                BACKTEST,
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

/// Comma-separated symbol list, trimmed and upper-cased. Empty tokens and
/// duplicates are rejected.
pub fn parse_codes(input: &str) -> Result<Vec<String>, MtfError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(MtfError::invalid(BACKTEST, "codes", "empty token in code list"));
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(MtfError::invalid(
                BACKTEST,
                "codes",
                format!("duplicate code: {}", code),
            ));
        }
        codes.push(code);
    }

    Ok(codes)
}
