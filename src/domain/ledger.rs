//! Reference execution ledger.
//!
//! Fills position decisions at the bar close in whole shares, charges a
//! percentage commission on each side, and keeps cash, the open lot, closed
//! trades and the equity curve. The decision engine only ever sees the
//! [`PositionSnapshot`] this ledger produces.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::decision::{DecisionAction, PositionDecision};
use crate::domain::position::{ClosedTrade, PositionSnapshot};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
/// Percent of traded value, so 0.2 is 0.2%.
pub const DEFAULT_COMMISSION_PCT: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// What the ledger did with a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Bought {
        quantity: i64,
        price: f64,
        commission: f64,
    },
    Sold {
        quantity: i64,
        price: f64,
        commission: f64,
        pnl: f64,
        closed: bool,
    },
    /// Enter decision that could not buy a single share.
    InsufficientCapital,
}

#[derive(Debug, Clone, PartialEq)]
struct OpenLot {
    entry_date: NaiveDate,
    entry_price: f64,
    initial_quantity: i64,
    quantity: i64,
    entry_commission: f64,
    stop_loss_price: f64,
    take_profit_price: f64,
}

/// Commission for a trade of `trade_value`: `trade_value * pct / 100`.
pub fn calculate_commission(trade_value: f64, commission_pct: f64) -> f64 {
    trade_value * commission_pct / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    symbol: String,
    initial_capital: f64,
    commission_pct: f64,
    cash: f64,
    lot: Option<OpenLot>,
    closed_trades: Vec<ClosedTrade>,
    equity_curve: Vec<EquityPoint>,
}

impl Ledger {
    pub fn new(symbol: impl Into<String>, initial_capital: f64, commission_pct: f64) -> Self {
        Ledger {
            symbol: symbol.into(),
            initial_capital,
            commission_pct,
            cash: initial_capital,
            lot: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn quantity(&self) -> i64 {
        self.lot.as_ref().map_or(0, |lot| lot.quantity)
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        match &self.lot {
            Some(lot) => PositionSnapshot {
                is_open: true,
                entry_price: lot.entry_price,
                stop_loss_price: lot.stop_loss_price,
                take_profit_price: lot.take_profit_price,
                size_fraction_remaining: lot.quantity as f64 / lot.initial_quantity as f64,
            },
            None => PositionSnapshot::flat(),
        }
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.quantity() as f64 * price
    }

    /// Record end-of-bar equity marked at `price`.
    pub fn mark(&mut self, date: NaiveDate, price: f64) {
        let equity = self.equity(price);
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Execute `decision` at `price`. Returns `None` when nothing traded.
    pub fn apply(&mut self, decision: &PositionDecision, date: NaiveDate, price: f64) -> Option<Fill> {
        if !price.is_finite() || price <= 0.0 {
            return None;
        }
        match decision.action {
            DecisionAction::Enter if self.lot.is_none() => Some(self.buy(decision, date, price)),
            DecisionAction::PartialExit => {
                let held = self.quantity();
                let to_sell = (held as f64 * decision.size_fraction).floor() as i64;
                let to_sell = to_sell.clamp(1, held.max(1));
                self.sell(to_sell, date, price)
            }
            DecisionAction::FullExit => {
                let held = self.quantity();
                self.sell(held, date, price)
            }
            _ => None,
        }
    }

    fn buy(&mut self, decision: &PositionDecision, date: NaiveDate, price: f64) -> Fill {
        let available = self.cash * decision.size_fraction;
        let unit_cost = price * (1.0 + self.commission_pct / 100.0);
        let quantity = (available / unit_cost).floor() as i64;
        if quantity <= 0 {
            return Fill::InsufficientCapital;
        }

        let cost = quantity as f64 * price;
        let commission = calculate_commission(cost, self.commission_pct);
        self.cash -= cost + commission;
        self.lot = Some(OpenLot {
            entry_date: date,
            entry_price: price,
            initial_quantity: quantity,
            quantity,
            entry_commission: commission,
            stop_loss_price: decision.stop_loss_price.unwrap_or(0.0),
            take_profit_price: decision.take_profit_price.unwrap_or(f64::INFINITY),
        });

        Fill::Bought {
            quantity,
            price,
            commission,
        }
    }

    fn sell(&mut self, quantity: i64, date: NaiveDate, price: f64) -> Option<Fill> {
        let lot = self.lot.as_mut()?;
        if quantity <= 0 {
            return None;
        }
        let quantity = quantity.min(lot.quantity);

        let value = quantity as f64 * price;
        let commission = calculate_commission(value, self.commission_pct);
        let entry_share = lot.entry_commission * quantity as f64 / lot.initial_quantity as f64;
        let pnl = quantity as f64 * (price - lot.entry_price) - entry_share - commission;

        self.cash += value - commission;
        lot.quantity -= quantity;
        self.closed_trades.push(ClosedTrade {
            symbol: self.symbol.clone(),
            quantity,
            entry_price: lot.entry_price,
            exit_price: price,
            entry_date: lot.entry_date,
            exit_date: date,
            pnl,
        });

        let closed = lot.quantity == 0;
        if closed {
            self.lot = None;
        }
        Some(Fill::Sold {
            quantity,
            price,
            commission,
            pnl,
            closed,
        })
    }
}
