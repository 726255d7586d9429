//! Daily bar source port trait.

use crate::domain::error::MtfError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Supplies ordered daily bars per symbol. Shared across batch workers.
pub trait BarSource: Send + Sync {
    /// Bars dated within `[start_date, end_date]`, ascending. Gaps in the
    /// calendar are allowed; an unknown symbol yields an empty vector or
    /// an error, at the adapter's discretion.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtfError>;

    fn list_symbols(&self) -> Result<Vec<String>, MtfError>;
}
