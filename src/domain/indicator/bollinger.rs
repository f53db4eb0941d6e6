//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//! Indices before `period - 1` hold the all-zero `Bollinger::default()`.

use serde::Serialize;

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Output has the same length as `series`.
pub fn bollinger_bands(series: &[f64], period: usize, k: f64) -> Vec<Bollinger> {
    let mut out = vec![Bollinger::default(); series.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..series.len() {
        let window = &series[i + 1 - period..=i];
        let middle = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|p| {
                let diff = p - middle;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        out[i] = Bollinger {
            upper: middle + k * stddev,
            middle,
            lower: middle - k * stddev,
        };
    }

    out
}

pub fn calculate_bollinger(
    candles: &[Candle],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let warmup = period.saturating_sub(1);
    let bands = bollinger_bands(&closes(candles), period, mult);

    let values = candles
        .iter()
        .zip(bands)
        .enumerate()
        .map(|(i, (candle, band))| IndicatorPoint {
            timestamp: candle.timestamp,
            valid: period > 0 && i >= warmup,
            value: IndicatorValue::Bollinger {
                upper: band.upper,
                middle: band.middle,
                lower: band.lower,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
