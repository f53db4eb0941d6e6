//! Account balance and order submission ports.

use crate::domain::account::{Account, Pair};
use crate::domain::decision::Action;
use crate::domain::error::TraderError;

pub trait AccountSource {
    fn get_balance(&self, pair: &Pair) -> Result<Account, TraderError>;
}

pub trait OrderSink {
    /// `size` is quote notional for buys and base units for sells.
    fn submit_order(&self, instrument: &str, side: Action, size: f64) -> Result<(), TraderError>;
}
