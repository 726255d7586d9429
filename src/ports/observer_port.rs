//! Event sink for per-symbol simulation events.
//!
//! The domain never logs directly; it reports through this trait. Every
//! method has a no-op default so sinks implement only what they need.

use chrono::NaiveDate;

use crate::domain::batch::SkipReason;
use crate::domain::decision::PositionDecision;
use crate::domain::ledger::Fill;
use crate::domain::readings::MultiTimeframeSnapshot;
use crate::domain::scoring::{TrendSignal, TrendState};

pub trait SignalObserver: Send + Sync {
    fn on_trend_change(
        &self,
        _symbol: &str,
        _date: NaiveDate,
        _from: TrendState,
        _to: TrendState,
        _score: i32,
    ) {
    }

    fn on_decision(
        &self,
        _symbol: &str,
        _snapshot: &MultiTimeframeSnapshot,
        _signal: &TrendSignal,
        _decision: &PositionDecision,
    ) {
    }

    fn on_fill(&self, _symbol: &str, _date: NaiveDate, _fill: &Fill) {}

    fn on_skipped(&self, _symbol: &str, _reason: &SkipReason) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SignalObserver for NullObserver {}
