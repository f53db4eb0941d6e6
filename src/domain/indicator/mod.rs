//! Technical indicator library.
//!
//! Each indicator module exposes two layers:
//! - a pure slice function (`sma`, `ema`, `rsi`, ...) over an ascending price
//!   series, returning only the defined values (or zero markers for Bollinger);
//! - a candle-level `calculate_*` wrapper that aligns those values to the
//!   candle series as an [`IndicatorSeries`] with per-point validity.
//!
//! Insufficient history never errors: slice functions return an empty result
//! and the aligned series marks every point invalid.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use atr::{atr, calculate_atr};
pub use bollinger::{bollinger_bands, calculate_bollinger, Bollinger};
pub use ema::{calculate_ema, ema};
pub use macd::{calculate_macd, macd, Macd};
pub use rsi::{calculate_rsi, rsi};
pub use sma::{calculate_sma, sma};
pub use stochastic::{calculate_stochastic, stochastic, Stochastic};

use crate::domain::candle::Candle;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    /// The scalar for single-valued indicators.
    pub fn as_simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The value at `index` if it is defined.
    pub fn value_at(&self, index: usize) -> Option<&IndicatorValue> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| &p.value)
    }

    pub fn latest(&self) -> Option<&IndicatorValue> {
        self.values.len().checked_sub(1).and_then(|i| self.value_at(i))
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Right-align a compact output against the candle series.
///
/// Slice functions emit values only once enough history exists, so the
/// first `candles.len() - compact.len()` points are warmup and carry
/// `placeholder` with `valid = false`.
pub(crate) fn align<T>(
    candles: &[Candle],
    indicator_type: IndicatorType,
    compact: Vec<T>,
    placeholder: IndicatorValue,
    to_value: impl Fn(T) -> IndicatorValue,
) -> IndicatorSeries {
    let offset = candles.len().saturating_sub(compact.len());
    let mut compact = compact.into_iter();

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let defined = if i >= offset { compact.next() } else { None };
            match defined {
                Some(v) => IndicatorPoint {
                    timestamp: candle.timestamp,
                    valid: true,
                    value: to_value(v),
                },
                None => IndicatorPoint {
                    timestamp: candle.timestamp,
                    valid: false,
                    value: placeholder.clone(),
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::candle::Candle;
    use chrono::{Duration, TimeZone, Utc};

    pub fn make_candles(prices: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}
