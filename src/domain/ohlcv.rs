//! OHLCV bar representation and the append-only daily bar store.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::error::MtfError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// A bar whose high equals its low has no range to place the close in.
    pub fn is_zero_width(&self) -> bool {
        self.high == self.low
    }

    /// Reason the bar cannot be used, if any.
    pub fn defect(&self) -> Option<&'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Some("non-finite price");
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Some("non-positive price");
        }
        if self.high < self.low {
            return Some("high below low");
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("invalid volume");
        }
        None
    }
}

/// Ordered daily bars for one symbol. Dates are strictly increasing.
#[derive(Debug, Clone)]
pub struct BarStore {
    symbol: String,
    bars: Vec<OhlcvBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl BarStore {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
            date_index: HashMap::new(),
        }
    }

    pub fn from_bars(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, MtfError> {
        let mut store = Self::new(symbol);
        store.bars.reserve(bars.len());
        for bar in bars {
            store.append(bar)?;
        }
        Ok(store)
    }

    pub fn append(&mut self, bar: OhlcvBar) -> Result<(), MtfError> {
        if let Some(last) = self.bars.last() {
            if bar.date <= last.date {
                return Err(MtfError::OutOfOrderBar {
                    symbol: self.symbol.clone(),
                    date: bar.date,
                    last: last.date,
                });
            }
        }
        if let Some(reason) = bar.defect() {
            return Err(MtfError::MalformedBar {
                symbol: self.symbol.clone(),
                date: bar.date,
                reason: reason.to_string(),
            });
        }
        self.date_index.insert(bar.date, self.bars.len());
        self.bars.push(bar);
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    /// Number of bars dated on or before `as_of`.
    pub fn count_up_to(&self, as_of: NaiveDate) -> usize {
        self.bars.partition_point(|b| b.date <= as_of)
    }

    /// All bars dated on or before `as_of`.
    pub fn up_to(&self, as_of: NaiveDate) -> &[OhlcvBar] {
        &self.bars[..self.count_up_to(as_of)]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }
}
