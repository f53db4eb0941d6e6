//! OHLCV candle representation and series ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// True when timestamps never decrease.
pub fn is_ascending(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

/// Returns the series in ascending time order, borrowing when it already is.
///
/// Market-data sources may deliver newest-first; every window calculation in
/// this crate assumes oldest-first, so all entry points go through here.
pub fn normalize_ascending(candles: &[Candle]) -> Cow<'_, [Candle]> {
    if is_ascending(candles) {
        Cow::Borrowed(candles)
    } else {
        let mut sorted = candles.to_vec();
        sorted.sort_by_key(|c| c.timestamp);
        Cow::Owned(sorted)
    }
}

pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

pub fn highs(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.high).collect()
}

pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}
