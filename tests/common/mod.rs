#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use mtftrader::domain::batch::SkipReason;
use mtftrader::domain::decision::PositionDecision;
use mtftrader::domain::error::MtfError;
use mtftrader::domain::ledger::Fill;
pub use mtftrader::domain::ohlcv::OhlcvBar;
use mtftrader::domain::readings::MultiTimeframeSnapshot;
use mtftrader::domain::scoring::{TrendSignal, TrendState};
use mtftrader::domain::strategy::StrategyConfig;
use mtftrader::ports::data_port::BarSource;
use mtftrader::ports::observer_port::SignalObserver;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory bar source with scripted failures.
pub struct MemoryBarSource {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub panics: Vec<String>,
}

impl MemoryBarSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            panics: Vec::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_panic(mut self, symbol: &str) -> Self {
        self.panics.push(symbol.to_string());
        self
    }
}

impl BarSource for MemoryBarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtfError> {
        if self.panics.iter().any(|s| s == symbol) {
            panic!("scripted failure for {symbol}");
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MtfError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, MtfError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TrendChange {
        symbol: String,
        date: NaiveDate,
        from: TrendState,
        to: TrendState,
    },
    Decision {
        symbol: String,
        date: NaiveDate,
        signal: TrendSignal,
        decision: PositionDecision,
    },
    Fill {
        symbol: String,
        date: NaiveDate,
        fill: Fill,
    },
    Skipped {
        symbol: String,
        reason: SkipReason,
    },
}

/// Observer that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn trend_changes(&self, symbol: &str) -> Vec<(TrendState, TrendState)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::TrendChange { symbol: s, from, to, .. } if s == symbol => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn decisions(&self, symbol: &str) -> Vec<(NaiveDate, TrendSignal, PositionDecision)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Decision {
                    symbol: s,
                    date,
                    signal,
                    decision,
                } if s == symbol => Some((date, signal, decision)),
                _ => None,
            })
            .collect()
    }
}

impl SignalObserver for RecordingObserver {
    fn on_trend_change(
        &self,
        symbol: &str,
        date: NaiveDate,
        from: TrendState,
        to: TrendState,
        _score: i32,
    ) {
        self.events.lock().unwrap().push(Event::TrendChange {
            symbol: symbol.to_string(),
            date,
            from,
            to,
        });
    }

    fn on_decision(
        &self,
        symbol: &str,
        snapshot: &MultiTimeframeSnapshot,
        signal: &TrendSignal,
        decision: &PositionDecision,
    ) {
        self.events.lock().unwrap().push(Event::Decision {
            symbol: symbol.to_string(),
            date: snapshot.date,
            signal: *signal,
            decision: *decision,
        });
    }

    fn on_fill(&self, symbol: &str, date: NaiveDate, fill: &Fill) {
        self.events.lock().unwrap().push(Event::Fill {
            symbol: symbol.to_string(),
            date,
            fill: fill.clone(),
        });
    }

    fn on_skipped(&self, symbol: &str, reason: &SkipReason) {
        self.events.lock().unwrap().push(Event::Skipped {
            symbol: symbol.to_string(),
            reason: reason.clone(),
        });
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive weekdays starting at `start`.
pub fn business_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut d = start;
    while days.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(d);
        }
        d += Duration::days(1);
    }
    days
}

/// Bars with open = high = low = close.
pub fn flat_bars(dates: &[NaiveDate], closes: &[f64]) -> Vec<OhlcvBar> {
    dates
        .iter()
        .zip(closes)
        .map(|(&date, &close)| OhlcvBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 10_000.0,
        })
        .collect()
}

pub const SCENARIO_START: (i32, u32, u32) = (2022, 1, 3);
pub const SCENARIO_TURN: usize = 279;

/// 400 weekday bars: a slow decline through bar 279, then a clean linear rise.
pub fn decline_then_rise() -> Vec<OhlcvBar> {
    let (y, m, d) = SCENARIO_START;
    let dates = business_days(date(y, m, d), 400);
    let closes: Vec<f64> = (0..400)
        .map(|i| {
            if i <= SCENARIO_TURN {
                100.0 - 0.05 * i as f64
            } else {
                100.0 - 0.05 * SCENARIO_TURN as f64 + 0.3 * (i - SCENARIO_TURN) as f64
            }
        })
        .collect();
    flat_bars(&dates, &closes)
}

/// 400 weekday bars falling steadily.
pub fn steady_decline() -> Vec<OhlcvBar> {
    let (y, m, d) = SCENARIO_START;
    let dates = business_days(date(y, m, d), 400);
    let closes: Vec<f64> = (0..400).map(|i| 100.0 - 0.05 * i as f64).collect();
    flat_bars(&dates, &closes)
}

/// Short periods so monthly readings settle inside a 400-bar history.
pub fn fast_strategy() -> StrategyConfig {
    StrategyConfig {
        fast_period: 2,
        slow_period: 3,
        signal_period: 2,
        kdj_period: 3,
        ..StrategyConfig::default()
    }
}

pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
