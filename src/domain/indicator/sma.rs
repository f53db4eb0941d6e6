//! Simple Moving Average.
//!
//! Running-sum implementation: subtract the value leaving the window, add the
//! value entering it. The sum is rebuilt from the window every
//! `SMA_RESYNC_INTERVAL` steps so rounding drift stays bounded on long series.

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue};

pub const SMA_RESYNC_INTERVAL: usize = 4096;

/// Output length is `series.len() - period + 1`; empty when there is not
/// enough data or `period == 0`.
pub fn sma(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    let n = period as f64;
    let mut out = Vec::with_capacity(series.len() - period + 1);
    let mut sum: f64 = series[..period].iter().sum();
    out.push(sum / n);

    for i in period..series.len() {
        let steps = i - period + 1;
        if steps % SMA_RESYNC_INTERVAL == 0 {
            sum = series[i + 1 - period..=i].iter().sum();
        } else {
            sum += series[i] - series[i - period];
        }
        out.push(sum / n);
    }

    out
}

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    align(
        candles,
        IndicatorType::Sma(period),
        sma(&closes(candles), period),
        IndicatorValue::Simple(0.0),
        IndicatorValue::Simple,
    )
}
