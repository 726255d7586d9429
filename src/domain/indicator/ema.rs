//! Exponential Moving Average indicator.
//!
//! α = 2/(n+1), seeded with the first input, then EMA[i] = EMA[i-1] + α·(x[i] - EMA[i-1]).
//! Defined from the first bar onward. An undefined input yields an undefined
//! output and the next defined input reseeds the average.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

pub fn ema_values(inputs: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; inputs.len()];
    }

    let alpha = smoothing_factor(period);
    let mut prev: Option<f64> = None;

    inputs
        .iter()
        .map(|input| {
            prev = match (*input, prev) {
                (Some(x), Some(ema)) => Some(ema + alpha * (x - ema)),
                (Some(x), None) => Some(x),
                (None, _) => None,
            };
            prev
        })
        .collect()
}

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let ema = ema_values(&closes, period);

    let values = bars
        .iter()
        .zip(ema)
        .map(|(bar, value)| match value {
            Some(v) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(v),
            },
            None => IndicatorPoint::undefined(bar.date, IndicatorValue::Simple(f64::NAN)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
