//! Forwards simulation events to `tracing`, keyed by the `symbol` field.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::batch::SkipReason;
use crate::domain::decision::{DecisionAction, PositionDecision};
use crate::domain::ledger::Fill;
use crate::domain::readings::MultiTimeframeSnapshot;
use crate::domain::scoring::{TrendSignal, TrendState};
use crate::ports::observer_port::SignalObserver;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SignalObserver for TracingObserver {
    fn on_trend_change(
        &self,
        symbol: &str,
        date: NaiveDate,
        from: TrendState,
        to: TrendState,
        score: i32,
    ) {
        info!(symbol, %date, %from, %to, score, "trend change");
    }

    fn on_decision(
        &self,
        symbol: &str,
        snapshot: &MultiTimeframeSnapshot,
        signal: &TrendSignal,
        decision: &PositionDecision,
    ) {
        match decision.action {
            DecisionAction::NoAction | DecisionAction::Hold => {
                debug!(
                    symbol,
                    date = %snapshot.date,
                    action = %decision.action,
                    score = signal.score,
                    defined = signal.defined,
                    "decision"
                );
            }
            _ => {
                info!(
                    symbol,
                    date = %snapshot.date,
                    action = %decision.action,
                    score = signal.score,
                    trend = %signal.trend,
                    stop = ?decision.stop_loss_price,
                    target = ?decision.take_profit_price,
                    reason = ?decision.exit_reason,
                    weekly_macd_golden_cross = snapshot.weekly_macd_golden_cross,
                    "decision"
                );
            }
        }
    }

    fn on_fill(&self, symbol: &str, date: NaiveDate, fill: &Fill) {
        match fill {
            Fill::Bought {
                quantity,
                price,
                commission,
            } => info!(symbol, %date, quantity, price, commission, "bought"),
            Fill::Sold {
                quantity,
                price,
                pnl,
                closed,
                ..
            } => info!(symbol, %date, quantity, price, pnl, closed, "sold"),
            Fill::InsufficientCapital => warn!(symbol, %date, "entry skipped, insufficient capital"),
        }
    }

    fn on_skipped(&self, symbol: &str, reason: &SkipReason) {
        warn!(symbol, %reason, "symbol skipped");
    }
}
