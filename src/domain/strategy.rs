//! Strategy parameters for the multi-timeframe trend strategy.
//!
//! A `StrategyConfig` is built once (defaults or INI via
//! `config_validation`), validated, and then shared read-only by every
//! simulation.

use crate::domain::error::MtfError;
use crate::domain::indicator::kdj::DEFAULT_K_PERIOD;
use crate::domain::indicator::macd::{min_bars, DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EMA_PERIOD: usize = 20;

/// Which trend rule drives the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringProfile {
    /// Signed weighted score with buy/sell thresholds.
    #[default]
    Weighted,
    /// Monthly KDJ cross gated by MACD histogram and DIF slope.
    CrossSlope,
}

impl FromStr for ScoringProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weighted" => Ok(ScoringProfile::Weighted),
            "cross_slope" | "crossslope" => Ok(ScoringProfile::CrossSlope),
            other => Err(format!(
                "unknown profile '{}', expected weighted or cross_slope",
                other
            )),
        }
    }
}

impl fmt::Display for ScoringProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringProfile::Weighted => write!(f, "weighted"),
            ScoringProfile::CrossSlope => write!(f, "cross_slope"),
        }
    }
}

/// Points added (condition true) or subtracted (false) per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub monthly_macd: i32,
    pub weekly_kdj: i32,
    pub daily_ema: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            monthly_macd: 10,
            weekly_kdj: 20,
            daily_ema: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub profile: ScoringProfile,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub kdj_period: usize,
    pub ema_period: usize,
    /// Fraction of available cash committed on entry.
    pub position_size: f64,
    /// Stop distance below entry, as a fraction (0.2 = 20%).
    pub stop_loss_pct: f64,
    /// Target distance above entry, as a fraction.
    pub take_profit_pct: f64,
    /// Fraction of the remaining position sold on each bearish bar.
    pub downtrend_exit_size: f64,
    pub buy_threshold: i32,
    pub sell_threshold: i32,
    pub monthly_macd_threshold: f64,
    pub weights: ScoreWeights,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            profile: ScoringProfile::Weighted,
            fast_period: DEFAULT_FAST,
            slow_period: DEFAULT_SLOW,
            signal_period: DEFAULT_SIGNAL,
            kdj_period: DEFAULT_K_PERIOD,
            ema_period: DEFAULT_EMA_PERIOD,
            position_size: 1.0,
            stop_loss_pct: 0.2,
            take_profit_pct: 0.9,
            downtrend_exit_size: 0.5,
            buy_threshold: 20,
            sell_threshold: 0,
            monthly_macd_threshold: 0.1,
            weights: ScoreWeights::default(),
        }
    }
}

const SECTION: &str = "strategy";

impl StrategyConfig {
    /// Weekly and monthly series shorter than this score as Neutral.
    pub fn min_higher_timeframe_bars(&self) -> usize {
        min_bars(self.slow_period, self.signal_period)
    }

    pub fn validate(&self) -> Result<(), MtfError> {
        for (key, value) in [
            ("fast_period", self.fast_period),
            ("slow_period", self.slow_period),
            ("signal_period", self.signal_period),
            ("kdj_period", self.kdj_period),
            ("ema_period", self.ema_period),
        ] {
            if value == 0 {
                return Err(MtfError::invalid(SECTION, key, "period must be at least 1"));
            }
        }
        if self.fast_period >= self.slow_period {
            return Err(MtfError::invalid(
                SECTION,
                "fast_period",
                "fast_period must be below slow_period",
            ));
        }

        unit_fraction("position_size", self.position_size)?;
        unit_fraction("downtrend_exit_size", self.downtrend_exit_size)?;
        non_negative("stop_loss_pct", self.stop_loss_pct)?;
        non_negative("take_profit_pct", self.take_profit_pct)?;
        non_negative("monthly_macd_threshold", self.monthly_macd_threshold)?;
        if self.stop_loss_pct >= 1.0 {
            return Err(MtfError::invalid(
                SECTION,
                "stop_loss_pct",
                "stop_loss_pct must be below 1",
            ));
        }

        if self.buy_threshold <= self.sell_threshold {
            return Err(MtfError::invalid(
                SECTION,
                "buy_threshold",
                "buy_threshold must be above sell_threshold",
            ));
        }
        for (key, weight) in [
            ("monthly_macd_weight", self.weights.monthly_macd),
            ("weekly_kdj_weight", self.weights.weekly_kdj),
            ("daily_ema_weight", self.weights.daily_ema),
        ] {
            if weight < 0 {
                return Err(MtfError::invalid(SECTION, key, "weight must be non-negative"));
            }
        }
        Ok(())
    }
}

fn unit_fraction(key: &str, value: f64) -> Result<(), MtfError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(MtfError::invalid(
            SECTION,
            key,
            format!("{} must be in (0, 1]", key),
        ));
    }
    Ok(())
}

fn non_negative(key: &str, value: f64) -> Result<(), MtfError> {
    if !(value >= 0.0 && value.is_finite()) {
        return Err(MtfError::invalid(
            SECTION,
            key,
            format!("{} must be non-negative", key),
        ));
    }
    Ok(())
}
