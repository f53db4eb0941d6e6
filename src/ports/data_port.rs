//! Market data port.

use crate::domain::account::Pair;
use crate::domain::candle::Candle;
use crate::domain::error::TraderError;

pub trait MarketDataSource {
    /// Up to `count` most recent candles, in either time order.
    fn get_candles(&self, pair: &Pair, count: usize) -> Result<Vec<Candle>, TraderError>;
}
