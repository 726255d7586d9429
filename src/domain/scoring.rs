//! Trend scoring and the hysteretic trend state machine.
//!
//! Two profiles share one state machine:
//!
//! - `Weighted`: monthly histogram above the threshold, weekly K above D and
//!   daily close above its EMA each add their weight when true and subtract it
//!   when false. Uptrend is entered at `score >= buy_threshold` and held until
//!   `score <= sell_threshold`, which enters Downtrend.
//! - `CrossSlope`: Uptrend is entered on a monthly K-over-D cross with a
//!   positive histogram and rising DIF; a monthly D-over-K cross with falling
//!   DIF flips to Downtrend. Weekly K above D confirms entries.
//!
//! Either profile reports Neutral with no signals while the weekly or monthly
//! series is shorter than `slow_period + signal_period`, or while any reading
//! it depends on is undefined. Such bars leave the held state untouched.

use std::fmt;

use serde::Serialize;

use crate::domain::readings::TimeframeReadings;
use crate::domain::strategy::{ScoringProfile, StrategyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendState {
    #[default]
    Neutral,
    Uptrend,
    Downtrend,
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendState::Neutral => write!(f, "neutral"),
            TrendState::Uptrend => write!(f, "uptrend"),
            TrendState::Downtrend => write!(f, "downtrend"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendSignal {
    pub score: i32,
    pub trend: TrendState,
    pub buy_signal: bool,
    pub sell_signal: bool,
    /// False when the bar was scored Neutral for lack of defined readings.
    pub defined: bool,
}

impl TrendSignal {
    pub fn undefined() -> Self {
        TrendSignal {
            score: 0,
            trend: TrendState::Neutral,
            buy_signal: false,
            sell_signal: false,
            defined: false,
        }
    }
}

/// Signed weighted score, or `None` if any component is undefined.
pub fn weighted_score(
    config: &StrategyConfig,
    daily: &TimeframeReadings,
    weekly: &TimeframeReadings,
    monthly: &TimeframeReadings,
) -> Option<i32> {
    let signed = |condition: bool, weight: i32| if condition { weight } else { -weight };

    let histogram = monthly.macd?.histogram;
    let weights = &config.weights;
    Some(
        signed(histogram > config.monthly_macd_threshold, weights.monthly_macd)
            + signed(weekly.k_above_d()?, weights.weekly_kdj)
            + signed(daily.close_above_ema()?, weights.daily_ema),
    )
}

/// Per-symbol scorer. Holds the hysteresis state between bars.
#[derive(Debug, Clone)]
pub struct TrendScorer {
    config: StrategyConfig,
    state: TrendState,
}

impl TrendScorer {
    pub fn new(config: &StrategyConfig) -> Self {
        TrendScorer {
            config: config.clone(),
            state: TrendState::Neutral,
        }
    }

    /// Held trend state after the last defined bar.
    pub fn state(&self) -> TrendState {
        self.state
    }

    pub fn score(
        &mut self,
        daily: &TimeframeReadings,
        weekly: &TimeframeReadings,
        monthly: &TimeframeReadings,
        position_open: bool,
    ) -> TrendSignal {
        let min_bars = self.config.min_higher_timeframe_bars();
        if !weekly.is_settled(min_bars) || !monthly.is_settled(min_bars) {
            return TrendSignal::undefined();
        }
        let Some(score) = weighted_score(&self.config, daily, weekly, monthly) else {
            return TrendSignal::undefined();
        };

        match self.config.profile {
            ScoringProfile::Weighted => self.weighted(score, position_open),
            ScoringProfile::CrossSlope => self
                .cross_slope(score, weekly, monthly, position_open)
                .unwrap_or_else(TrendSignal::undefined),
        }
    }

    fn weighted(&mut self, score: i32, position_open: bool) -> TrendSignal {
        let bullish = score >= self.config.buy_threshold;
        let bearish = score <= self.config.sell_threshold;
        if bullish {
            self.state = TrendState::Uptrend;
        } else if bearish {
            self.state = TrendState::Downtrend;
        }

        TrendSignal {
            score,
            trend: self.state,
            buy_signal: bullish && !position_open,
            sell_signal: bearish && position_open,
            defined: true,
        }
    }

    fn cross_slope(
        &mut self,
        score: i32,
        weekly: &TimeframeReadings,
        monthly: &TimeframeReadings,
        position_open: bool,
    ) -> Option<TrendSignal> {
        let histogram = monthly.macd?.histogram;
        let slope = monthly.dif_slope()?;
        let crossed_up = monthly.kdj_crossed_up()?;
        let crossed_down = monthly.kdj_crossed_down()?;
        let weekly_confirms = weekly.k_above_d()?;

        if crossed_up && histogram > 0.0 && slope > 0.0 {
            self.state = TrendState::Uptrend;
        } else if crossed_down && slope < 0.0 {
            self.state = TrendState::Downtrend;
        }

        let uptrend = self.state == TrendState::Uptrend;
        let downtrend = self.state == TrendState::Downtrend;
        Some(TrendSignal {
            score,
            trend: self.state,
            buy_signal: uptrend && !position_open && weekly_confirms,
            sell_signal: downtrend && position_open,
            defined: true,
        })
    }
}
