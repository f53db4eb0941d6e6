//! Indicator batch computation and per-candle annotation.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::candle::{normalize_ascending, Candle};
use crate::domain::indicator::{
    self, atr, bollinger, macd, rsi, stochastic, Bollinger, IndicatorSeries, IndicatorType,
    IndicatorValue, Macd, Stochastic,
};

/// Compute each requested indicator over the same candle series.
///
/// `candles` must already be ascending; see [`annotate`] for the entry point
/// that normalizes order.
pub fn compute_indicators(
    candles: &[Candle],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    types
        .iter()
        .map(|t| {
            let series = match *t {
                IndicatorType::Sma(p) => indicator::calculate_sma(candles, p),
                IndicatorType::Ema(p) => indicator::calculate_ema(candles, p),
                IndicatorType::Rsi(p) => indicator::calculate_rsi(candles, p),
                IndicatorType::Atr(p) => indicator::calculate_atr(candles, p),
                IndicatorType::Macd { fast, slow, signal } => {
                    indicator::calculate_macd(candles, fast, slow, signal)
                }
                IndicatorType::Stochastic { k_period, d_period } => {
                    indicator::calculate_stochastic(candles, k_period, d_period)
                }
                IndicatorType::Bollinger {
                    period,
                    stddev_mult_x100,
                } => indicator::calculate_bollinger(candles, period, stddev_mult_x100),
            };
            (t.clone(), series)
        })
        .collect()
}

/// Derived values for a single candle. `None` means not enough history yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub ma5: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub bollinger: Option<Bollinger>,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub atr: Option<f64>,
    pub stochastic: Option<Stochastic>,
}

impl IndicatorSet {
    /// Round every field down to `decimals` places, each from its own value.
    pub fn floored(&self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let f = |v: f64| (v * scale).floor() / scale;

        IndicatorSet {
            ma5: self.ma5.map(f),
            ma50: self.ma50.map(f),
            ma200: self.ma200.map(f),
            bollinger: self.bollinger.map(|b| Bollinger {
                upper: f(b.upper),
                middle: f(b.middle),
                lower: f(b.lower),
            }),
            rsi: self.rsi.map(f),
            macd: self.macd.map(|m| Macd {
                line: f(m.line),
                signal: f(m.signal),
                histogram: f(m.histogram),
            }),
            atr: self.atr.map(f),
            stochastic: self.stochastic.map(|s| Stochastic {
                k: f(s.k),
                d: f(s.d),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedCandle {
    #[serde(flatten)]
    pub candle: Candle,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
}

/// Candles fetched per cycle: enough for MA200 to be defined over the context.
pub const HISTORY_CANDLES: usize = 231;
/// Candles handed to a decision source.
pub const CONTEXT_CANDLES: usize = 30;
/// Decimal places kept on indicators handed to a decision source.
pub const CONTEXT_DECIMALS: u32 = 1;

const MA_SHORT: IndicatorType = IndicatorType::Sma(5);
const MA_MEDIUM: IndicatorType = IndicatorType::Sma(50);
const MA_LONG: IndicatorType = IndicatorType::Sma(200);

fn standard_types() -> Vec<IndicatorType> {
    vec![
        MA_SHORT,
        MA_MEDIUM,
        MA_LONG,
        IndicatorType::Bollinger {
            period: bollinger::DEFAULT_PERIOD,
            stddev_mult_x100: (bollinger::DEFAULT_MULTIPLIER * 100.0) as u32,
        },
        IndicatorType::Rsi(rsi::DEFAULT_PERIOD),
        IndicatorType::Macd {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        },
        IndicatorType::Atr(atr::DEFAULT_PERIOD),
        IndicatorType::Stochastic {
            k_period: stochastic::DEFAULT_K_PERIOD,
            d_period: stochastic::DEFAULT_D_PERIOD,
        },
    ]
}

/// Attach the standard indicator set to every candle, oldest first.
///
/// Input order does not matter; the output is always ascending.
pub fn annotate(candles: &[Candle]) -> Vec<AnnotatedCandle> {
    let candles = normalize_ascending(candles);
    let types = standard_types();
    let computed = compute_indicators(&candles, &types);
    let at = |t: &IndicatorType, i: usize| computed.get(t).and_then(|s| s.value_at(i));

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let mut set = IndicatorSet {
                ma5: at(&MA_SHORT, i).and_then(IndicatorValue::as_simple),
                ma50: at(&MA_MEDIUM, i).and_then(IndicatorValue::as_simple),
                ma200: at(&MA_LONG, i).and_then(IndicatorValue::as_simple),
                ..IndicatorSet::default()
            };

            for t in &types[3..] {
                match (t, at(t, i)) {
                    (
                        IndicatorType::Bollinger { .. },
                        Some(&IndicatorValue::Bollinger {
                            upper,
                            middle,
                            lower,
                        }),
                    ) => {
                        set.bollinger = Some(Bollinger {
                            upper,
                            middle,
                            lower,
                        })
                    }
                    (IndicatorType::Rsi(_), Some(&IndicatorValue::Simple(v))) => set.rsi = Some(v),
                    (IndicatorType::Atr(_), Some(&IndicatorValue::Simple(v))) => set.atr = Some(v),
                    (
                        IndicatorType::Macd { .. },
                        Some(&IndicatorValue::Macd {
                            line,
                            signal,
                            histogram,
                        }),
                    ) => {
                        set.macd = Some(Macd {
                            line,
                            signal,
                            histogram,
                        })
                    }
                    (IndicatorType::Stochastic { .. }, Some(&IndicatorValue::Stochastic { k, d })) => {
                        set.stochastic = Some(Stochastic { k, d })
                    }
                    _ => {}
                }
            }

            AnnotatedCandle {
                candle: candle.clone(),
                indicators: set,
            }
        })
        .collect()
}

/// Annotate `candles` and keep the last `len` entries, with indicators floored
/// to [`CONTEXT_DECIMALS`]. This is the view a decision source receives.
pub fn decision_window(candles: &[Candle], len: usize) -> Vec<AnnotatedCandle> {
    let mut annotated = annotate(candles);
    let skip = annotated.len().saturating_sub(len);
    annotated
        .drain(skip..)
        .map(|mut a| {
            a.indicators = a.indicators.floored(CONTEXT_DECIMALS);
            a
        })
        .collect()
}
