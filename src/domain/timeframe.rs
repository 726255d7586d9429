//! Daily to weekly/monthly resampling and as-of alignment.
//!
//! Aggregated bars are dated by their last contributing daily bar, so a
//! higher-timeframe bar never carries a date the simulation has not reached.
//! The newest bar of a series is usually a partial period.

use chrono::{Datelike, NaiveDate};

use super::ohlcv::{BarStore, OhlcvBar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

/// Calendar bucket a date falls into for a given timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub index: u32,
}

impl Timeframe {
    /// Weekly buckets follow ISO weeks (Monday to Sunday).
    pub fn period_key(self, date: NaiveDate) -> PeriodKey {
        match self {
            Timeframe::Daily => PeriodKey {
                year: date.year(),
                index: date.ordinal(),
            },
            Timeframe::Weekly => {
                let week = date.iso_week();
                PeriodKey {
                    year: week.year(),
                    index: week.week(),
                }
            }
            Timeframe::Monthly => PeriodKey {
                year: date.year(),
                index: date.month(),
            },
        }
    }

    pub fn same_period(self, a: NaiveDate, b: NaiveDate) -> bool {
        self.period_key(a) == self.period_key(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeframeSeries {
    timeframe: Timeframe,
    bars: Vec<OhlcvBar>,
}

impl TimeframeSeries {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            bars: Vec::new(),
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// Fold one daily bar into the series: extend the open period or start a new one.
    pub fn push_daily(&mut self, bar: &OhlcvBar) {
        match self.bars.last_mut() {
            Some(current) if self.timeframe.same_period(current.date, bar.date) => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
                current.date = bar.date;
            }
            _ => self.bars.push(bar.clone()),
        }
    }

    pub fn closes_by_date(&self) -> Vec<(NaiveDate, Option<f64>)> {
        self.bars.iter().map(|b| (b.date, Some(b.close))).collect()
    }
}

/// Group daily bars by calendar period: open=first, high=max, low=min,
/// close=last, volume=sum.
pub fn resample(daily: &[OhlcvBar], timeframe: Timeframe) -> TimeframeSeries {
    let mut series = TimeframeSeries::new(timeframe);
    for bar in daily {
        series.push_daily(bar);
    }
    series
}

/// Weekly and monthly views of a bar store as of a simulation date.
#[derive(Debug, Clone, Copy)]
pub struct AggregatedView<'a> {
    pub weekly: &'a TimeframeSeries,
    pub monthly: &'a TimeframeSeries,
}

/// Maintains weekly and monthly series as the simulation date advances.
///
/// Closed periods are never rebuilt while the date moves forward; only the
/// open period's partial bar is extended. Moving the date backwards forces a
/// full rebuild from the store.
#[derive(Debug, Clone)]
pub struct TimeframeAggregator {
    weekly: TimeframeSeries,
    monthly: TimeframeSeries,
    as_of: Option<NaiveDate>,
    consumed: usize,
}

impl Default for TimeframeAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeframeAggregator {
    pub fn new() -> Self {
        Self {
            weekly: TimeframeSeries::new(Timeframe::Weekly),
            monthly: TimeframeSeries::new(Timeframe::Monthly),
            as_of: None,
            consumed: 0,
        }
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }

    pub fn refresh(&mut self, store: &BarStore, as_of: NaiveDate) -> AggregatedView<'_> {
        let end = store.count_up_to(as_of);
        let moved_back = self.as_of.is_some_and(|prev| as_of < prev);

        if moved_back || end < self.consumed {
            let visible = &store.bars()[..end];
            self.weekly = resample(visible, Timeframe::Weekly);
            self.monthly = resample(visible, Timeframe::Monthly);
        } else {
            for bar in &store.bars()[self.consumed..end] {
                self.weekly.push_daily(bar);
                self.monthly.push_daily(bar);
            }
        }

        self.consumed = end;
        self.as_of = Some(as_of);
        self.view()
    }

    pub fn view(&self) -> AggregatedView<'_> {
        AggregatedView {
            weekly: &self.weekly,
            monthly: &self.monthly,
        }
    }
}

/// Align higher-timeframe values onto daily dates.
///
/// Each daily date takes the value of the latest higher-timeframe point dated
/// on or before it; undefined values do not overwrite an earlier defined one.
/// Dates before the first defined point are `None`. Both inputs must be in
/// ascending date order.
pub fn map_to_daily(higher: &[(NaiveDate, Option<f64>)], daily_dates: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut mapped = Vec::with_capacity(daily_dates.len());
    let mut cursor = 0;
    let mut carried = None;

    for &date in daily_dates {
        while cursor < higher.len() && higher[cursor].0 <= date {
            if let Some(v) = higher[cursor].1 {
                carried = Some(v);
            }
            cursor += 1;
        }
        mapped.push(carried);
    }

    mapped
}
