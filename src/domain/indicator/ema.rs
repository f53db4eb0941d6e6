//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n prices, then
//! EMA[i] = (P[i] - EMA[i-1]) * k + EMA[i-1].

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue};

/// Output length is `series.len() - period + 1`, first value is the seed.
pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(series.len() - period + 1);
    let mut value = series[..period].iter().sum::<f64>() / period as f64;
    out.push(value);

    for &price in &series[period..] {
        value = (price - value) * k + value;
        out.push(value);
    }

    out
}

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    align(
        candles,
        IndicatorType::Ema(period),
        ema(&closes(candles), period),
        IndicatorValue::Simple(0.0),
        IndicatorValue::Simple,
    )
}
