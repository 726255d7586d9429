//! Latest indicator readings per resolution.
//!
//! A reading set is computed from a bar slice by full recomputation of the
//! indicator series and keeps only what scoring needs: the newest value and,
//! for crossover checks, the one before it.

use chrono::NaiveDate;

use crate::domain::indicator::{
    calculate_ema, calculate_kdj, calculate_macd, IndicatorPoint, IndicatorSeries, KdjReading,
    MacdReading,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::StrategyConfig;

/// DIF-DEA gap a weekly MACD cross must exceed to count as a golden cross.
pub const WEEKLY_GOLDEN_CROSS_GAP: f64 = 0.09;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeframeReadings {
    pub bar_count: usize,
    pub close: Option<f64>,
    pub ema: Option<f64>,
    pub macd: Option<MacdReading>,
    pub prev_macd: Option<MacdReading>,
    pub kdj: Option<KdjReading>,
    pub prev_kdj: Option<KdjReading>,
}

/// Newest and previous values of a series, each `None` when undefined.
fn latest_pair<T>(
    series: &IndicatorSeries,
    read: impl Fn(&IndicatorPoint) -> Option<T>,
) -> (Option<T>, Option<T>) {
    (
        series.from_end(0).and_then(&read),
        series.from_end(1).and_then(&read),
    )
}

impl TimeframeReadings {
    /// Close and EMA only; the daily resolution needs nothing else.
    pub fn daily(bars: &[OhlcvBar], config: &StrategyConfig) -> Self {
        let ema = calculate_ema(bars, config.ema_period);
        Self {
            bar_count: bars.len(),
            close: bars.last().map(|b| b.close),
            ema: ema.from_end(0).and_then(|p| p.simple()),
            ..Self::default()
        }
    }

    /// MACD and KDJ with previous-bar values, for weekly and monthly series.
    pub fn higher(bars: &[OhlcvBar], config: &StrategyConfig) -> Self {
        let macd = calculate_macd(
            bars,
            config.fast_period,
            config.slow_period,
            config.signal_period,
        );
        let kdj = calculate_kdj(bars, config.kdj_period);
        let (macd_now, macd_prev) = latest_pair(&macd, |p| p.macd());
        let (kdj_now, kdj_prev) = latest_pair(&kdj, |p| p.kdj());

        Self {
            bar_count: bars.len(),
            close: bars.last().map(|b| b.close),
            ema: None,
            macd: macd_now,
            prev_macd: macd_prev,
            kdj: kdj_now,
            prev_kdj: kdj_prev,
        }
    }

    pub fn is_settled(&self, min_bars: usize) -> bool {
        self.bar_count >= min_bars
    }

    pub fn close_above_ema(&self) -> Option<bool> {
        Some(self.close? > self.ema?)
    }

    pub fn k_above_d(&self) -> Option<bool> {
        let kdj = self.kdj?;
        Some(kdj.k > kdj.d)
    }

    /// K moved from at-or-below D to above it on the newest bar.
    pub fn kdj_crossed_up(&self) -> Option<bool> {
        let (prev, now) = (self.prev_kdj?, self.kdj?);
        Some(prev.k <= prev.d && now.k > now.d)
    }

    /// D moved from at-or-below K to above it on the newest bar.
    pub fn kdj_crossed_down(&self) -> Option<bool> {
        let (prev, now) = (self.prev_kdj?, self.kdj?);
        Some(prev.d <= prev.k && now.d > now.k)
    }

    /// Change in DIF between the last two bars.
    pub fn dif_slope(&self) -> Option<f64> {
        Some(self.macd?.dif - self.prev_macd?.dif)
    }

    pub fn macd_golden_cross(&self, min_gap: f64) -> bool {
        match (self.prev_macd, self.macd) {
            (Some(prev), Some(now)) => {
                prev.dif <= prev.dea && now.dif > now.dea && now.dif - now.dea > min_gap
            }
            _ => false,
        }
    }
}

/// Readings for all three resolutions at one simulation date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiTimeframeSnapshot {
    pub date: NaiveDate,
    pub daily: TimeframeReadings,
    pub weekly: TimeframeReadings,
    pub monthly: TimeframeReadings,
    /// Reported to observers only; not part of any score.
    pub weekly_macd_golden_cross: bool,
}

impl MultiTimeframeSnapshot {
    pub fn compute(
        date: NaiveDate,
        daily: &[OhlcvBar],
        weekly: &[OhlcvBar],
        monthly: &[OhlcvBar],
        config: &StrategyConfig,
    ) -> Self {
        let weekly = TimeframeReadings::higher(weekly, config);
        Self {
            date,
            daily: TimeframeReadings::daily(daily, config),
            weekly_macd_golden_cross: weekly.macd_golden_cross(WEEKLY_GOLDEN_CROSS_GAP),
            weekly,
            monthly: TimeframeReadings::higher(monthly, config),
        }
    }
}
