//! Stochastic Oscillator.
//!
//! %K = (C - lowest low) / (highest high - lowest low) * 100 over k periods,
//! 50 when the window has no range. %D is the simple mean of the last d %K.
//! First value at input index k - 1 + d - 1.

use serde::Serialize;

use crate::domain::candle::{closes, highs, lows, Candle};
use crate::domain::indicator::{align, sma, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

fn percent_k(high: &[f64], low: &[f64], close: &[f64], k_period: usize) -> Vec<f64> {
    (k_period - 1..close.len())
        .map(|i| {
            let start = i + 1 - k_period;
            let highest = high[start..=i].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let lowest = low[start..=i].iter().cloned().fold(f64::INFINITY, f64::min);
            let range = highest - lowest;
            if range == 0.0 {
                50.0
            } else {
                ((close[i] - lowest) / range * 100.0).clamp(0.0, 100.0)
            }
        })
        .collect()
}

pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    d_period: usize,
) -> Vec<Stochastic> {
    let len = high.len().min(low.len()).min(close.len());
    if k_period == 0 || d_period == 0 || len < k_period {
        return Vec::new();
    }

    let k_values = percent_k(&high[..len], &low[..len], &close[..len], k_period);
    if k_values.len() < d_period {
        return Vec::new();
    }
    let d_values = sma(&k_values, d_period);

    k_values[d_period - 1..]
        .iter()
        .zip(d_values)
        .map(|(&k, d)| Stochastic {
            k,
            d: d.clamp(0.0, 100.0),
        })
        .collect()
}

pub fn calculate_stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> IndicatorSeries {
    let (high, low, close) = (highs(candles), lows(candles), closes(candles));

    align(
        candles,
        IndicatorType::Stochastic { k_period, d_period },
        stochastic(&high, &low, &close, k_period, d_period),
        IndicatorValue::Stochastic { k: 0.0, d: 0.0 },
        |s| IndicatorValue::Stochastic { k: s.k, d: s.d },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stochastic_close_at_high_is_100() {
        let high = [10.0, 11.0, 12.0];
        let low = [8.0, 9.0, 10.0];
        let close = [9.0, 10.0, 12.0];

        let out = stochastic(&high, &low, &close, 3, 1);
        assert_eq!(out.len(), 1);
        assert!((out[0].k - 100.0).abs() < f64::EPSILON);
        assert!((out[0].d - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stochastic_close_at_low_is_0() {
        let high = [12.0, 11.0, 10.0];
        let low = [10.0, 9.0, 8.0];
        let close = [11.0, 10.0, 8.0];

        let out = stochastic(&high, &low, &close, 3, 1);
        assert!(out[0].k.abs() < f64::EPSILON);
    }

    #[test]
    fn stochastic_flat_window_is_50() {
        let flat = [5.0; 6];
        let out = stochastic(&flat, &flat, &flat, 3, 2);
        assert!(out.iter().all(|s| s.k == 50.0 && s.d == 50.0));
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let high = [10.0, 10.0, 10.0, 10.0];
        let low = [0.0, 0.0, 0.0, 0.0];
        let close = [2.0, 4.0, 6.0, 8.0];

        // %K with k=1: 20, 40, 60, 80; %D with d=2: 30, 50, 70
        let out = stochastic(&high, &low, &close, 1, 2);
        assert_eq!(out.len(), 3);
        assert!((out[0].k - 40.0).abs() < 1e-10);
        assert!((out[0].d - 30.0).abs() < 1e-10);
        assert!((out[2].k - 80.0).abs() < 1e-10);
        assert!((out[2].d - 70.0).abs() < 1e-10);
    }

    #[test]
    fn stochastic_warmup_offset() {
        let n = 20;
        let high: Vec<f64> = (0..n).map(|i| 11.0 + i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 9.0 + i as f64).collect();
        let close: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();

        let out = stochastic(&high, &low, &close, 14, 3);
        assert_eq!(out.len(), n - (14 - 1 + 3 - 1));
    }

    #[test]
    fn stochastic_insufficient_data() {
        assert!(stochastic(&[1.0], &[1.0], &[1.0], 3, 3).is_empty());
        assert!(stochastic(&[1.0], &[1.0], &[1.0], 0, 3).is_empty());
        assert!(stochastic(&[1.0], &[1.0], &[1.0], 1, 0).is_empty());
        // enough for one %K but not for %D
        let v = [1.0; 14];
        assert!(stochastic(&v, &v, &v, 14, 3).is_empty());
    }

    proptest! {
        #[test]
        fn stochastic_in_range(
            bars in prop::collection::vec((1.0f64..1000.0, 0.0f64..50.0, 0.0f64..1.0), 1..80),
            k in 1usize..20,
            d in 1usize..5,
        ) {
            let high: Vec<f64> = bars.iter().map(|(base, spread, _)| base + spread).collect();
            let low: Vec<f64> = bars.iter().map(|(base, _, _)| *base).collect();
            let close: Vec<f64> = bars.iter().map(|(base, spread, f)| base + spread * f).collect();

            for s in stochastic(&high, &low, &close, k, d) {
                prop_assert!((0.0..=100.0).contains(&s.k));
                prop_assert!((0.0..=100.0).contains(&s.d));
            }
        }
    }
}
