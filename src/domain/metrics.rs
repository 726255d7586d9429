//! Backtest summary statistics.

use serde::Serialize;

use crate::domain::ledger::{EquityPoint, Ledger};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
}

impl Metrics {
    pub fn compute(ledger: &Ledger) -> Self {
        let initial_capital = ledger.initial_capital();
        let final_equity = ledger
            .equity_curve()
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let trades = ledger.closed_trades();
        let trades_won = trades.iter().filter(|t| t.pnl > 0.0).count();
        let trades_lost = trades.iter().filter(|t| t.pnl < 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            trades_won as f64 / trades.len() as f64
        };

        Metrics {
            total_return,
            max_drawdown: compute_drawdown(ledger.equity_curve()),
            trade_count: trades.len(),
            trades_won,
            trades_lost,
            win_rate,
        }
    }
}

/// Largest peak-to-trough decline as a fraction of the peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::{DecisionAction, PositionDecision};
    use chrono::{Duration, NaiveDate};

    fn date(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i)
    }

    fn order(action: DecisionAction, size_fraction: f64) -> PositionDecision {
        PositionDecision {
            action,
            size_fraction,
            stop_loss_price: Some(1.0),
            take_profit_price: Some(1_000.0),
            exit_reason: None,
        }
    }

    #[test]
    fn metrics_empty_ledger() {
        let ledger = Ledger::new("AAA", 100_000.0, 0.0);
        let metrics = Metrics::compute(&ledger);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.trade_count, 0);
        assert_eq!(metrics.win_rate, 0.0);
    }

    #[test]
    fn metrics_total_return_and_drawdown() {
        let mut ledger = Ledger::new("AAA", 10_000.0, 0.0);
        ledger.mark(date(0), 100.0);
        ledger.apply(&order(DecisionAction::Enter, 1.0), date(1), 100.0);
        ledger.mark(date(1), 100.0);
        ledger.mark(date(2), 120.0);
        ledger.mark(date(3), 90.0);
        ledger.apply(&order(DecisionAction::FullExit, 1.0), date(4), 110.0);
        ledger.mark(date(4), 110.0);

        let metrics = Metrics::compute(&ledger);
        assert!((metrics.total_return - 0.10).abs() < 1e-9);
        // Peak 12_000, trough 9_000.
        assert!((metrics.max_drawdown - 0.25).abs() < 1e-9);
        assert_eq!(metrics.trade_count, 1);
        assert_eq!(metrics.trades_won, 1);
        assert!((metrics.win_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_counts_partial_sales_as_trades() {
        let mut ledger = Ledger::new("AAA", 10_000.0, 0.0);
        ledger.apply(&order(DecisionAction::Enter, 1.0), date(0), 100.0);
        ledger.apply(&order(DecisionAction::PartialExit, 0.5), date(1), 90.0);
        ledger.apply(&order(DecisionAction::FullExit, 1.0), date(2), 120.0);

        let metrics = Metrics::compute(&ledger);
        assert_eq!(metrics.trade_count, 2);
        assert_eq!(metrics.trades_won, 1);
        assert_eq!(metrics.trades_lost, 1);
        assert!((metrics.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_monotonic_rise_is_zero() {
        let curve: Vec<EquityPoint> = (0..5)
            .map(|i| EquityPoint {
                date: date(i),
                equity: 100.0 + i as f64,
            })
            .collect();
        assert_eq!(compute_drawdown(&curve), 0.0);
    }
}
