//! Simulated single-instrument, long-only portfolio used by the backtest
//! engine.

use chrono::{DateTime, Utc};

use super::metrics::EquityPoint;

/// Holdings below this many units are treated as flat.
const DUST_UNITS: f64 = 1e-12;

/// Result of a simulated fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub units: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub capital: f64,
    pub units: f64,
    /// Volume-weighted entry price of the open position; zero when flat.
    pub avg_entry_price: f64,
    pub peak_equity: f64,
    pub max_drawdown: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            capital: initial_capital,
            units: 0.0,
            avg_entry_price: 0.0,
            peak_equity: initial_capital,
            max_drawdown: 0.0,
            equity_curve: Vec::new(),
        }
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.capital + self.units * price
    }

    /// Mark to market at `price`, update peak and drawdown, and append to the
    /// equity curve. Returns the marked equity.
    pub fn mark(&mut self, timestamp: DateTime<Utc>, price: f64) -> f64 {
        let equity = self.equity(price);
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > 0.0 {
            let drawdown = (self.peak_equity - equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
        self.equity_curve.push(EquityPoint { timestamp, equity });
        equity
    }

    /// Spend `pct` of free capital at `price`, paying `commission` out of the
    /// spend. `None` when nothing can be bought.
    pub fn buy(&mut self, price: f64, pct: f64, commission: f64) -> Option<Fill> {
        if self.capital <= 0.0 || pct <= 0.0 || price <= 0.0 {
            return None;
        }

        let spend = self.capital * pct;
        let bought = spend * (1.0 - commission) / price;
        if bought <= 0.0 {
            return None;
        }

        self.avg_entry_price = if self.units > 0.0 {
            (self.avg_entry_price * self.units + price * bought) / (self.units + bought)
        } else {
            price
        };
        self.units += bought;
        self.capital = (self.capital - spend).max(0.0);

        Some(Fill {
            units: bought,
            pnl: 0.0,
        })
    }

    /// Sell `pct` of the held units at `price`, net of `commission`.
    /// `None` when flat.
    pub fn sell(&mut self, price: f64, pct: f64, commission: f64) -> Option<Fill> {
        if self.units <= 0.0 || pct <= 0.0 || price <= 0.0 {
            return None;
        }

        let sold = self.units * pct;
        let net = sold * price * (1.0 - commission);
        let pnl = net - sold * self.avg_entry_price;

        self.capital += net;
        self.units -= sold;
        if self.units <= DUST_UNITS {
            self.units = 0.0;
            self.avg_entry_price = 0.0;
        }

        Some(Fill { units: sold, pnl })
    }
}
