//! Account balances as reported by the account source.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::TraderError;

/// A spot trading pair such as `BTC-USDT` (base-quote).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    pub base: String,
    pub quote: String,
}

impl Pair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Pair {
            base: base.into().to_ascii_uppercase(),
            quote: quote.into().to_ascii_uppercase(),
        }
    }

    /// Exchange instrument identifier.
    pub fn instrument(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(['-', '/']) {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Pair::new(base.trim(), quote.trim()))
            }
            _ => Err(TraderError::ConfigInvalid {
                section: "trading".into(),
                key: "pair".into(),
                reason: format!("expected BASE-QUOTE, got {s:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBalance {
    /// Units held.
    pub equity: f64,
    pub equity_usd: f64,
    pub avg_entry_price: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub total_equity: f64,
    pub assets: HashMap<String, AssetBalance>,
}

impl Account {
    pub fn new(total_equity: f64) -> Self {
        Account {
            total_equity,
            assets: HashMap::new(),
        }
    }

    pub fn with_asset(mut self, coin: &str, balance: AssetBalance) -> Self {
        self.assets.insert(coin.to_ascii_uppercase(), balance);
        self
    }

    pub fn asset(&self, coin: &str) -> Option<&AssetBalance> {
        self.assets.get(&coin.to_ascii_uppercase())
    }

    /// Units of `coin` held, zero when absent.
    pub fn units(&self, coin: &str) -> f64 {
        self.asset(coin).map(|a| a.equity).unwrap_or(0.0)
    }
}
