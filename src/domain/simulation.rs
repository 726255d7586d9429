//! Per-symbol simulation.
//!
//! [`SymbolSimulation`] is the per-day pipeline: append the bar, refresh the
//! weekly and monthly series as of that date, recompute readings, score, and
//! decide. [`run_backtest`] drives it over a full history against the
//! reference [`Ledger`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::backtest::BacktestConfig;
use crate::domain::decision::{decide, DecisionAction, PositionDecision};
use crate::domain::error::MtfError;
use crate::domain::ledger::{Fill, Ledger};
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::{BarStore, OhlcvBar};
use crate::domain::position::{ClosedTrade, PositionSnapshot};
use crate::domain::readings::MultiTimeframeSnapshot;
use crate::domain::scoring::{TrendScorer, TrendSignal, TrendState};
use crate::domain::strategy::StrategyConfig;
use crate::domain::timeframe::TimeframeAggregator;
use crate::ports::observer_port::SignalObserver;

/// Everything derived from one daily bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarOutcome {
    pub snapshot: MultiTimeframeSnapshot,
    pub signal: TrendSignal,
    pub decision: PositionDecision,
}

pub struct SymbolSimulation {
    symbol: String,
    config: StrategyConfig,
    store: BarStore,
    aggregator: TimeframeAggregator,
    scorer: TrendScorer,
}

impl SymbolSimulation {
    /// Fails if `config` does not pass [`StrategyConfig::validate`].
    pub fn new(symbol: impl Into<String>, config: &StrategyConfig) -> Result<Self, MtfError> {
        config.validate()?;
        let symbol = symbol.into();
        Ok(Self {
            store: BarStore::new(symbol.clone()),
            symbol,
            config: config.clone(),
            aggregator: TimeframeAggregator::new(),
            scorer: TrendScorer::new(config),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        self.store.bars()
    }

    /// Held trend state. Undefined bars do not change it.
    pub fn trend_state(&self) -> TrendState {
        self.scorer.state()
    }

    /// Process the next daily bar against the caller's position.
    ///
    /// Fails without touching any state if the bar is out of order or
    /// malformed.
    pub fn step(
        &mut self,
        bar: OhlcvBar,
        position: &PositionSnapshot,
        observer: &dyn SignalObserver,
    ) -> Result<BarOutcome, MtfError> {
        let date = bar.date;
        let close = bar.close;
        self.store.append(bar)?;

        let view = self.aggregator.refresh(&self.store, date);
        let snapshot = MultiTimeframeSnapshot::compute(
            date,
            self.store.bars(),
            view.weekly.bars(),
            view.monthly.bars(),
            &self.config,
        );

        let before = self.scorer.state();
        let signal = self.scorer.score(
            &snapshot.daily,
            &snapshot.weekly,
            &snapshot.monthly,
            position.is_open,
        );
        let after = self.scorer.state();
        if after != before {
            observer.on_trend_change(&self.symbol, date, before, after, signal.score);
        }

        let decision = decide(&signal, Some(close), position, &self.config);
        observer.on_decision(&self.symbol, &snapshot, &signal, &decision);

        Ok(BarOutcome {
            snapshot,
            signal,
            decision,
        })
    }
}

/// A decision that changed the position, as executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub action: DecisionAction,
    pub price: f64,
    pub quantity: i64,
    pub score: i32,
    pub trend: TrendState,
}

/// Exported per-symbol result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRecord {
    pub symbol: String,
    pub final_trend_state: TrendState,
    /// Score of the last bar, empty when that bar was undefined.
    pub latest_score: Option<i32>,
    pub buy_signal: bool,
    pub backtest_return: f64,
    pub last_price: f64,
    pub last_date: NaiveDate,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub record: SymbolRecord,
    pub metrics: Metrics,
    pub events: Vec<TradeEvent>,
    pub closed_trades: Vec<ClosedTrade>,
    /// Bars dropped because their prices were unusable.
    pub skipped_bars: usize,
}

/// Simulate `symbol` over `bars` and settle it through a fresh ledger.
///
/// Malformed bars are dropped and counted; the day produces no decision
/// and no equity mark. An out-of-order bar aborts the symbol.
pub fn run_backtest(
    symbol: &str,
    bars: Vec<OhlcvBar>,
    strategy: &StrategyConfig,
    backtest: &BacktestConfig,
    observer: &dyn SignalObserver,
) -> Result<SymbolReport, MtfError> {
    backtest.validate()?;
    let mut sim = SymbolSimulation::new(symbol, strategy)?;
    if bars.is_empty() {
        return Err(MtfError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let mut ledger = Ledger::new(symbol, backtest.initial_capital, backtest.commission_pct);
    let mut events = Vec::new();
    let mut last_signal = TrendSignal::undefined();
    let mut last_bar: Option<(NaiveDate, f64)> = None;
    let mut skipped_bars = 0;

    for bar in bars {
        let (date, close) = (bar.date, bar.close);
        let outcome = match sim.step(bar, &ledger.snapshot(), observer) {
            Ok(outcome) => outcome,
            Err(MtfError::MalformedBar { .. }) => {
                skipped_bars += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(fill) = ledger.apply(&outcome.decision, date, close) {
            observer.on_fill(symbol, date, &fill);
            let quantity = match fill {
                Fill::Bought { quantity, .. } | Fill::Sold { quantity, .. } => quantity,
                Fill::InsufficientCapital => 0,
            };
            if quantity > 0 {
                events.push(TradeEvent {
                    date,
                    action: outcome.decision.action,
                    price: close,
                    quantity,
                    score: outcome.signal.score,
                    trend: outcome.signal.trend,
                });
            }
        }
        ledger.mark(date, close);
        last_signal = outcome.signal;
        last_bar = Some((date, close));
    }

    let Some((last_date, last_price)) = last_bar else {
        return Err(MtfError::NoData {
            symbol: symbol.to_string(),
        });
    };

    let metrics = Metrics::compute(&ledger);
    let record = SymbolRecord {
        symbol: symbol.to_string(),
        final_trend_state: sim.trend_state(),
        latest_score: last_signal.defined.then_some(last_signal.score),
        buy_signal: last_signal.defined && last_signal.buy_signal,
        backtest_return: metrics.total_return,
        last_price,
        last_date,
        trade_count: metrics.trade_count,
    };

    Ok(SymbolReport {
        record,
        metrics,
        events,
        closed_trades: ledger.closed_trades().to_vec(),
        skipped_bars,
    })
}
