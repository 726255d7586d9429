//! KDJ stochastic oscillator.
//!
//! RSV = 100·(C - LL(n)) / (HH(n) - LL(n)) over the last n bars
//! K = (2/3)·K[prev] + (1/3)·RSV, D = (2/3)·D[prev] + (1/3)·K, J = 3K - 2D
//!
//! K and D are seeded with the first defined RSV. RSV is undefined during the
//! first n-1 bars and whenever the whole window has zero range; an undefined
//! RSV makes that bar's K/D/J undefined and the next defined RSV reseeds.
//! A single zero-width day inside a window that still has range is an
//! ordinary input.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_K_PERIOD: usize = 9;

/// Raw stochastic value for the window ending at `end` (inclusive).
pub fn rsv(bars: &[OhlcvBar], end: usize, period: usize) -> Option<f64> {
    if period == 0 || end + 1 < period || end >= bars.len() {
        return None;
    }
    let window = &bars[end + 1 - period..=end];
    let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let range = highest - lowest;
    if range <= 0.0 || !range.is_finite() {
        return None;
    }
    Some(100.0 * ((bars[end].close - lowest) / range))
}

pub fn calculate_kdj(bars: &[OhlcvBar], k_period: usize) -> IndicatorSeries {
    let undefined = IndicatorValue::Kdj {
        k: f64::NAN,
        d: f64::NAN,
        j: f64::NAN,
    };
    let mut values = Vec::with_capacity(bars.len());
    let mut prev: Option<(f64, f64)> = None;

    for (i, bar) in bars.iter().enumerate() {
        let current = rsv(bars, i, k_period).map(|r| match prev {
            Some((k_prev, d_prev)) => {
                // (2/3)·prev + (1/3)·new, written so equal inputs are a fixed point
                let k = k_prev + (r - k_prev) / 3.0;
                let d = d_prev + (k - d_prev) / 3.0;
                (k, d)
            }
            None => (r, r),
        });
        prev = current;

        values.push(match current {
            Some((k, d)) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Kdj {
                    k,
                    d,
                    j: 3.0 * k - 2.0 * d,
                },
            },
            None => IndicatorPoint::undefined(bar.date, undefined),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Kdj { k_period },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::{flat_bars, hlc_bars};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample_rows() -> Vec<(f64, f64, f64)> {
        vec![
            (12.0, 8.0, 10.0),
            (13.0, 9.0, 12.0),
            (14.0, 10.0, 11.0),
            (15.0, 11.0, 14.0),
            (13.0, 9.0, 10.0),
        ]
    }

    #[test]
    fn kdj_warmup() {
        let series = calculate_kdj(&hlc_bars(&sample_rows()), 3);
        assert_eq!(series.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn kdj_seed_and_recurrence() {
        let bars = hlc_bars(&sample_rows());
        let series = calculate_kdj(&bars, 3);

        // Window 0..=2: HH=14, LL=8, C=11 -> RSV=50.
        let seed = series.values[2].kdj().unwrap();
        assert_relative_eq!(seed.k, 50.0);
        assert_relative_eq!(seed.d, 50.0);
        assert_relative_eq!(seed.j, 50.0);

        // Window 1..=3: HH=15, LL=9, C=14 -> RSV=250/3.
        let rsv3 = 100.0 * 5.0 / 6.0;
        let k3 = 2.0 / 3.0 * 50.0 + rsv3 / 3.0;
        let d3 = 2.0 / 3.0 * 50.0 + k3 / 3.0;
        let p3 = series.values[3].kdj().unwrap();
        assert_relative_eq!(p3.k, k3, epsilon = 1e-9);
        assert_relative_eq!(p3.d, d3, epsilon = 1e-9);
        assert_relative_eq!(p3.j, 3.0 * k3 - 2.0 * d3, epsilon = 1e-9);
    }

    #[test]
    fn kdj_flat_window_is_undefined_then_reseeds() {
        let rows = vec![
            (10.0, 10.0, 10.0),
            (10.0, 10.0, 10.0),
            (10.0, 10.0, 10.0),
            (12.0, 10.0, 12.0),
            (13.0, 11.0, 12.0),
        ];
        let series = calculate_kdj(&hlc_bars(&rows), 3);

        assert!(!series.values[2].valid);
        // Window 1..=3: HH=12, LL=10, C=12 -> RSV=100 reseeds K=D=100.
        let p3 = series.values[3].kdj().unwrap();
        assert_relative_eq!(p3.k, 100.0);
        assert_relative_eq!(p3.d, 100.0);
        assert!(series.values[4].valid);
    }

    #[test]
    fn kdj_single_zero_width_day_continues_recurrence() {
        let mut rows = sample_rows();
        rows[3] = (12.0, 12.0, 12.0);
        let series = calculate_kdj(&hlc_bars(&rows), 3);

        let p2 = series.values[2].kdj().unwrap();
        let p3 = series.values[3].kdj().unwrap();
        // Window 1..=3: HH=14, LL=9, C=12 -> RSV=60.
        let k3 = 2.0 / 3.0 * p2.k + 60.0 / 3.0;
        assert_relative_eq!(p3.k, k3, epsilon = 1e-9);
        assert!(p3.j.is_finite());
    }

    #[test]
    fn kdj_zero_width_window_with_period_one() {
        let rows = vec![(11.0, 9.0, 10.0), (10.0, 10.0, 10.0), (12.0, 10.0, 11.0)];
        let series = calculate_kdj(&hlc_bars(&rows), 1);
        assert!(series.values[0].valid);
        assert!(!series.values[1].valid);
        // Reseeded from RSV=50 rather than continuing from bar 0.
        assert_relative_eq!(series.values[2].kdj().unwrap().k, 50.0);
    }

    #[test]
    fn kdj_period_zero_and_short_input() {
        let bars = hlc_bars(&sample_rows());
        assert_eq!(calculate_kdj(&bars, 0).valid_count(), 0);
        assert_eq!(calculate_kdj(&bars[..2], 3).len(), 2);
        assert_eq!(calculate_kdj(&bars[..2], 3).valid_count(), 0);
        assert!(calculate_kdj(&[], 3).is_empty());
    }

    #[test]
    fn rsv_at_window_high_is_exactly_100() {
        // Rising closes where each bar's high is its close.
        let mut close = 1.0;
        let mut rows = Vec::new();
        for i in 0..200 {
            close += 0.01 + (i % 7) as f64 * 0.37;
            rows.push((close, close * 0.98, close));
        }
        let bars = hlc_bars(&rows);
        for end in 2..bars.len() {
            assert_eq!(rsv(&bars, end, 3), Some(100.0), "end={end}");
        }

        let series = calculate_kdj(&bars, 3);
        let ks: Vec<f64> = series.values.iter().filter_map(|p| p.kdj()).map(|r| r.k).collect();
        assert!(ks.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn kdj_uptrend_keeps_k_above_d() {
        let mut prices: Vec<f64> = (0..20).map(|i| 50.0 - i as f64).collect();
        prices.extend((1..=20).map(|i| 31.0 + i as f64));
        let series = calculate_kdj(&flat_bars(&prices), 9);

        let last = series.from_end(0).unwrap().kdj().unwrap();
        assert!(last.k > last.d);
        assert!(last.j > last.k);
    }

    proptest! {
        #[test]
        fn kdj_output_length_matches_input(
            closes in prop::collection::vec(1.0f64..500.0, 0..80),
            period in 1usize..15,
        ) {
            let rows: Vec<(f64, f64, f64)> = closes.iter().map(|&c| (c * 1.01, c * 0.99, c)).collect();
            let series = calculate_kdj(&hlc_bars(&rows), period);
            prop_assert_eq!(series.len(), closes.len());
            for p in series.values.iter().take(period - 1) {
                prop_assert!(!p.valid);
            }
        }

        #[test]
        fn kdj_monotone_on_rising_closes(
            steps in prop::collection::vec(0.01f64..5.0, 12..60),
            spreads in prop::collection::vec(0.0f64..3.0, 60),
        ) {
            let mut close = 20.0;
            let rows: Vec<(f64, f64, f64)> = steps
                .iter()
                .zip(&spreads)
                .map(|(step, spread)| {
                    close += step;
                    (close, close - spread, close)
                })
                .collect();
            let series = calculate_kdj(&hlc_bars(&rows), 9);

            let readings: Vec<_> = series.values.iter().filter_map(|p| p.kdj()).collect();
            for w in readings.windows(2) {
                prop_assert!(w[1].k >= w[0].k);
                prop_assert!(w[1].d >= w[0].d);
                prop_assert!(w[1].j >= w[0].j);
            }
        }
    }
}
