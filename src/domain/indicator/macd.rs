//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! First value at input index slow - 1 + signal - 1.

use serde::Serialize;

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{align, ema, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(series: &[f64], fast: usize, slow: usize, signal_period: usize) -> Vec<Macd> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Vec::new();
    }

    let longest = fast.max(slow);
    let fast_ema = ema(series, fast);
    let slow_ema = ema(series, slow);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return Vec::new();
    }

    // Both EMAs end at the last input; trim their heads to the longer warmup.
    let line: Vec<f64> = fast_ema[longest - fast..]
        .iter()
        .zip(&slow_ema[longest - slow..])
        .map(|(f, s)| f - s)
        .collect();

    let signal = ema(&line, signal_period);
    line[signal_period.min(line.len()).saturating_sub(1)..]
        .iter()
        .zip(signal)
        .map(|(&l, s)| Macd {
            line: l,
            signal: s,
            histogram: l - s,
        })
        .collect()
}

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    align(
        candles,
        IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        macd(&closes(candles), fast, slow, signal_period),
        IndicatorValue::Macd {
            line: 0.0,
            signal: 0.0,
            histogram: 0.0,
        },
        |m| IndicatorValue::Macd {
            line: m.line,
            signal: m.signal,
            histogram: m.histogram,
        },
    )
}
