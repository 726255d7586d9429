//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, aligned 1:1 with its input bars
//!
//! A point with `valid == false` is undefined; its payload holds NaN and must
//! not be read. Use the typed accessors, which return `None` for such points.

pub mod ema;
pub mod kdj;
pub mod macd;

pub use ema::{calculate_ema, ema_values};
pub use kdj::calculate_kdj;
pub use macd::calculate_macd;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd { dif: f64, dea: f64, histogram: f64 },
    Kdj { k: f64, d: f64, j: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Kdj {
        k_period: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

/// MACD reading at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdReading {
    pub dif: f64,
    pub dea: f64,
    pub histogram: f64,
}

/// KDJ reading at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjReading {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

impl IndicatorPoint {
    pub(crate) fn undefined(date: NaiveDate, value: IndicatorValue) -> Self {
        Self {
            date,
            valid: false,
            value,
        }
    }

    pub fn simple(&self) -> Option<f64> {
        match self.value {
            IndicatorValue::Simple(v) if self.valid => Some(v),
            _ => None,
        }
    }

    pub fn macd(&self) -> Option<MacdReading> {
        match self.value {
            IndicatorValue::Macd {
                dif,
                dea,
                histogram,
            } if self.valid => Some(MacdReading {
                dif,
                dea,
                histogram,
            }),
            _ => None,
        }
    }

    pub fn kdj(&self) -> Option<KdjReading> {
        match self.value {
            IndicatorValue::Kdj { k, d, j } if self.valid => Some(KdjReading { k, d, j }),
            _ => None,
        }
    }
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Point `back` bars before the newest one (`0` is the newest).
    pub fn from_end(&self, back: usize) -> Option<&IndicatorPoint> {
        self.values.len().checked_sub(back + 1).map(|i| &self.values[i])
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.valid).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Kdj { k_period } => write!(f, "KDJ({})", k_period),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_bars {
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::{Duration, NaiveDate};

    /// One bar per calendar day with open=high=low=close.
    pub fn flat_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    /// One bar per calendar day with the given (high, low, close).
    pub fn hlc_bars(rows: &[(f64, f64, f64)]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Ema(20).to_string(), "EMA(20)");
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
        assert_eq!(IndicatorType::Kdj { k_period: 9 }.to_string(), "KDJ(9)");
    }

    #[test]
    fn invalid_point_reads_as_none() {
        let p = IndicatorPoint::undefined(date(1), IndicatorValue::Simple(f64::NAN));
        assert_eq!(p.simple(), None);
        assert_eq!(p.macd(), None);
        assert_eq!(p.kdj(), None);
    }

    #[test]
    fn accessors_match_shape() {
        let p = IndicatorPoint {
            date: date(1),
            valid: true,
            value: IndicatorValue::Kdj {
                k: 60.0,
                d: 50.0,
                j: 80.0,
            },
        };
        assert_eq!(p.simple(), None);
        assert_eq!(p.macd(), None);
        assert_eq!(
            p.kdj(),
            Some(KdjReading {
                k: 60.0,
                d: 50.0,
                j: 80.0
            })
        );
    }

    #[test]
    fn from_end_indexes_backwards() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Ema(3),
            values: (1..=3)
                .map(|d| IndicatorPoint {
                    date: date(d),
                    valid: true,
                    value: IndicatorValue::Simple(d as f64),
                })
                .collect(),
        };
        assert_eq!(series.from_end(0).unwrap().simple(), Some(3.0));
        assert_eq!(series.from_end(2).unwrap().simple(), Some(1.0));
        assert!(series.from_end(3).is_none());
        assert_eq!(series.valid_count(), 3);
    }
}
