//! Position decision engine.
//!
//! Flat/Long state machine evaluated once per bar:
//!
//! 1. Missing or non-finite price: NoAction.
//! 2. Long: stop (`price <= stop`) is checked before target (`price >= target`);
//!    either one is a FullExit. Protection applies even on undefined bars.
//! 3. Undefined trend signal: NoAction.
//! 4. Long with `sell_signal` or Downtrend: PartialExit of
//!    `downtrend_exit_size` of what remains; otherwise Hold.
//! 5. Flat with `buy_signal`: Enter with stop and target derived from price.

use std::fmt;

use serde::Serialize;

use crate::domain::position::PositionSnapshot;
use crate::domain::scoring::{TrendSignal, TrendState};
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Enter,
    Hold,
    PartialExit,
    FullExit,
    NoAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionAction::Enter => "enter",
            DecisionAction::Hold => "hold",
            DecisionAction::PartialExit => "partial_exit",
            DecisionAction::FullExit => "full_exit",
            DecisionAction::NoAction => "no_action",
        };
        f.pad(name)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => f.write_str("stop_loss"),
            ExitReason::TakeProfit => f.write_str("take_profit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionDecision {
    pub action: DecisionAction,
    /// Enter: fraction of cash to commit. PartialExit: fraction of the
    /// remaining position to sell. FullExit: 1. Otherwise 0.
    pub size_fraction: f64,
    pub stop_loss_price: Option<f64>,
    pub take_profit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
}

impl PositionDecision {
    fn no_action() -> Self {
        PositionDecision {
            action: DecisionAction::NoAction,
            size_fraction: 0.0,
            stop_loss_price: None,
            take_profit_price: None,
            exit_reason: None,
        }
    }

    fn keeping_levels(action: DecisionAction, size_fraction: f64, pos: &PositionSnapshot) -> Self {
        PositionDecision {
            action,
            size_fraction,
            stop_loss_price: Some(pos.stop_loss_price),
            take_profit_price: Some(pos.take_profit_price),
            exit_reason: None,
        }
    }

    fn full_exit(pos: &PositionSnapshot, reason: ExitReason) -> Self {
        PositionDecision {
            exit_reason: Some(reason),
            ..Self::keeping_levels(DecisionAction::FullExit, 1.0, pos)
        }
    }
}

pub fn decide(
    signal: &TrendSignal,
    price: Option<f64>,
    position: &PositionSnapshot,
    config: &StrategyConfig,
) -> PositionDecision {
    let Some(price) = price.filter(|p| p.is_finite()) else {
        return PositionDecision::no_action();
    };

    if position.is_open {
        if position.should_stop_loss(price) {
            return PositionDecision::full_exit(position, ExitReason::StopLoss);
        }
        if position.should_take_profit(price) {
            return PositionDecision::full_exit(position, ExitReason::TakeProfit);
        }
        if !signal.defined {
            return PositionDecision::no_action();
        }
        if signal.sell_signal || signal.trend == TrendState::Downtrend {
            return PositionDecision::keeping_levels(
                DecisionAction::PartialExit,
                config.downtrend_exit_size,
                position,
            );
        }
        return PositionDecision::keeping_levels(DecisionAction::Hold, 0.0, position);
    }

    if signal.defined && signal.buy_signal {
        return PositionDecision {
            action: DecisionAction::Enter,
            size_fraction: config.position_size,
            stop_loss_price: Some(price * (1.0 - config.stop_loss_pct)),
            take_profit_price: Some(price * (1.0 + config.take_profit_pct)),
            exit_reason: None,
        };
    }

    PositionDecision::no_action()
}
