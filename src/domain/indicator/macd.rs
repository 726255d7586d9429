//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! DIF = EMA(fast) - EMA(slow)
//! DEA = EMA(signal) of DIF
//! Histogram = DIF - DEA (unscaled; charting conventions that double it are
//! a display concern)
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! Every EMA is seeded with its first input, so values exist from the first
//! bar; callers that need a settled reading gate on series length
//! (see [`min_bars`]).

use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// Series length below which MACD readings are treated as not yet settled.
pub fn min_bars(slow: usize, signal: usize) -> usize {
    slow + signal
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let undefined = IndicatorValue::Macd {
        dif: f64::NAN,
        dea: f64::NAN,
        histogram: f64::NAN,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: bars
                .iter()
                .map(|b| IndicatorPoint::undefined(b.date, undefined))
                .collect(),
        };
    }

    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let dif: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let dea = ema_values(&dif, signal_period);

    let values = bars
        .iter()
        .zip(dif.iter().zip(&dea))
        .map(|(bar, (dif, dea))| match (*dif, *dea) {
            (Some(dif), Some(dea)) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Macd {
                    dif,
                    dea,
                    histogram: dif - dea,
                },
            },
            _ => IndicatorPoint::undefined(bar.date, undefined),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::flat_bars;
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> Vec<OhlcvBar> {
        let prices: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        flat_bars(&prices)
    }

    #[test]
    fn macd_output_aligned_with_input() {
        let bars = ramp(40);
        let series = calculate_macd_default(&bars);
        assert_eq!(series.len(), bars.len());
        for (p, b) in series.values.iter().zip(&bars) {
            assert_eq!(p.date, b.date);
        }
    }

    #[test]
    fn macd_first_bar_is_zero_divergence() {
        let series = calculate_macd_default(&ramp(5));
        let first = series.values[0].macd().unwrap();
        assert_eq!(first.dif, 0.0);
        assert_eq!(first.dea, 0.0);
        assert_eq!(first.histogram, 0.0);
    }

    #[test]
    fn macd_histogram_equals_dif_minus_dea() {
        let series = calculate_macd_default(&ramp(40));
        for point in &series.values {
            let m = point.macd().unwrap();
            assert!((m.histogram - (m.dif - m.dea)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn macd_dif_is_fast_minus_slow() {
        let bars = flat_bars(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
        let series = calculate_macd(&bars, 3, 5, 2);

        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        let fast = ema_values(&closes, 3);
        let slow = ema_values(&closes, 5);

        for (i, point) in series.values.iter().enumerate() {
            let m = point.macd().unwrap();
            assert_relative_eq!(m.dif, fast[i].unwrap() - slow[i].unwrap());
        }
    }

    #[test]
    fn macd_rising_prices_positive_histogram() {
        let series = calculate_macd_default(&ramp(60));
        let last = series.from_end(0).unwrap().macd().unwrap();
        assert!(last.dif > 0.0);
        assert!(last.histogram > 0.0);
    }

    #[test]
    fn macd_constant_prices_zero() {
        let series = calculate_macd_default(&flat_bars(&[50.0; 30]));
        for p in &series.values {
            let m = p.macd().unwrap();
            assert_relative_eq!(m.dif, 0.0);
            assert_relative_eq!(m.histogram, 0.0);
        }
    }

    #[test]
    fn macd_zero_period_is_undefined_but_aligned() {
        let bars = ramp(3);
        for series in [
            calculate_macd(&bars, 0, 26, 9),
            calculate_macd(&bars, 12, 0, 9),
            calculate_macd(&bars, 12, 26, 0),
        ] {
            assert_eq!(series.len(), 3);
            assert_eq!(series.valid_count(), 0);
        }
    }

    #[test]
    fn macd_empty_bars() {
        assert!(calculate_macd_default(&[]).is_empty());
    }

    #[test]
    fn macd_indicator_type() {
        let series = calculate_macd(&ramp(3), 5, 10, 3);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }

    #[test]
    fn macd_min_bars_default() {
        assert_eq!(min_bars(DEFAULT_SLOW, DEFAULT_SIGNAL), 35);
    }

    #[test]
    fn macd_cross_flips_histogram_sign() {
        // Decline then rally: DIF must cross above DEA somewhere in the rally.
        let mut prices: Vec<f64> = (0..30).map(|i| 200.0 - 2.0 * i as f64).collect();
        prices.extend((0..30).map(|i| 142.0 + 3.0 * i as f64));
        let series = calculate_macd(&flat_bars(&prices), 3, 6, 3);

        let mut crossed = false;
        for w in series.values.windows(2) {
            let prev = w[0].macd().unwrap();
            let cur = w[1].macd().unwrap();
            if prev.dif <= prev.dea && cur.dif > cur.dea {
                assert!(prev.histogram <= 0.0);
                assert!(cur.histogram > 0.0);
                crossed = true;
            }
        }
        assert!(crossed);
    }
}
