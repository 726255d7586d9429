//! Position state as seen by the decision engine.

use chrono::NaiveDate;
use serde::Serialize;

/// Read-only view of the current position, owned by the execution ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot {
    pub is_open: bool,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    /// Share of the original entry quantity still held, in (0, 1] when open.
    pub size_fraction_remaining: f64,
}

impl PositionSnapshot {
    pub fn flat() -> Self {
        PositionSnapshot {
            is_open: false,
            entry_price: 0.0,
            stop_loss_price: 0.0,
            take_profit_price: 0.0,
            size_fraction_remaining: 0.0,
        }
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        self.is_open && price <= self.stop_loss_price
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        self.is_open && price >= self.take_profit_price
    }
}

impl Default for PositionSnapshot {
    fn default() -> Self {
        Self::flat()
    }
}

/// One completed (or partially completed) sale out of a long position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}
