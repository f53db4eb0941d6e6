//! Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! Seed is the simple mean of the first n true ranges, then Wilder smoothing
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::candle::{closes, highs, lows, Candle};
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 14;

fn true_ranges(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..high.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                hl
            } else {
                let prev_close = close[i - 1];
                hl.max((high[i] - prev_close).abs())
                    .max((low[i] - prev_close).abs())
            }
        })
        .collect()
}

/// Output length is `len - period + 1`. Columns are truncated to the
/// shortest of the three inputs.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let len = high.len().min(low.len()).min(close.len());
    if period == 0 || len < period {
        return Vec::new();
    }

    let tr = true_ranges(&high[..len], &low[..len], &close[..len]);
    let n = period as f64;
    let mut value = tr[..period].iter().sum::<f64>() / n;

    let mut out = Vec::with_capacity(len - period + 1);
    out.push(value);
    for &range in &tr[period..] {
        value = (value * (n - 1.0) + range) / n;
        out.push(value);
    }

    out
}

pub fn calculate_atr(candles: &[Candle], period: usize) -> IndicatorSeries {
    let (high, low, close) = (highs(candles), lows(candles), closes(candles));

    align(
        candles,
        IndicatorType::Atr(period),
        atr(&high, &low, &close, period),
        IndicatorValue::Simple(0.0),
        IndicatorValue::Simple,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Candle;
    use chrono::{Duration, TimeZone, Utc};

    fn make_candle(day: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_warmup() {
        let candles: Vec<Candle> = (0..5).map(|i| make_candle(i, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&candles, 3);

        assert_eq!(series.values.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn atr_seed_is_average() {
        let high = [110.0, 115.0, 120.0];
        let low = [100.0, 105.0, 110.0];
        let close = [105.0, 110.0, 115.0];

        // TR: 10, max(10, 10, 0) = 10, max(10, 10, 0) = 10
        let out = atr(&high, &low, &close, 3);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_uses_previous_close_gap() {
        let high = [110.0, 150.0];
        let low = [90.0, 140.0];
        let close = [100.0, 145.0];

        // TR: 20, max(10, 50, 40) = 50
        let out = atr(&high, &low, &close, 1);
        assert_eq!(out, vec![20.0, 50.0]);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let high = [12.0, 12.0, 20.0];
        let low = [10.0, 10.0, 10.0];
        let close = [11.0, 11.0, 11.0];

        // TR: 2, 2, 10; seed over 2 → 2; next (2*1 + 10)/2 = 6
        let out = atr(&high, &low, &close, 2);
        assert_eq!(out, vec![2.0, 6.0]);
    }

    #[test]
    fn atr_insufficient_data() {
        assert!(atr(&[1.0], &[0.5], &[0.8], 3).is_empty());
        assert!(atr(&[1.0, 2.0], &[0.5, 1.5], &[0.8, 1.8], 0).is_empty());
    }

    #[test]
    fn atr_constant_range() {
        let candles: Vec<Candle> = (0..20).map(|i| make_candle(i, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&candles, 14);
        let latest = series.latest().and_then(IndicatorValue::as_simple).unwrap();
        assert!((latest - 20.0).abs() < 1e-10);
    }
}
