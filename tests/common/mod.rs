#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sigmatrader::domain::account::{Account, Pair};
use sigmatrader::domain::candle::Candle;
use sigmatrader::domain::decision::{Action, Decision};
use sigmatrader::domain::error::TraderError;
use sigmatrader::ports::account_port::{AccountSource, OrderSink};
use sigmatrader::ports::clock_port::Clock;
use sigmatrader::ports::data_port::MarketDataSource;
use sigmatrader::ports::decision_port::{DecisionContext, DecisionSource};

pub fn day(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i)
}

pub fn make_candle(i: i64, close: f64) -> Candle {
    Candle {
        timestamp: day(i),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i as i64, c))
        .collect()
}

/// `n` candles rising by `step` per day from 100.
pub fn trending(n: usize, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * step).collect();
    make_candles(&closes)
}

/// Rises for `n / 2` days then falls back.
pub fn peak(n: usize) -> Vec<Candle> {
    let half = n / 2;
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let dist = if i < half { i } else { n - i };
            100.0 + dist as f64 * 2.0
        })
        .collect();
    make_candles(&closes)
}

pub struct MockMarket {
    pub data: HashMap<Pair, Vec<Candle>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, pair: Pair, candles: Vec<Candle>) -> Self {
        self.data.insert(pair, candles);
        self
    }
}

impl MarketDataSource for MockMarket {
    /// Newest first, like an exchange.
    fn get_candles(&self, pair: &Pair, count: usize) -> Result<Vec<Candle>, TraderError> {
        let mut candles = self.data.get(pair).cloned().unwrap_or_default();
        candles.reverse();
        candles.truncate(count);
        Ok(candles)
    }
}

pub struct MockAccount(pub Account);

impl AccountSource for MockAccount {
    fn get_balance(&self, _pair: &Pair) -> Result<Account, TraderError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct MockOrders {
    pub submitted: RefCell<Vec<(String, Action, f64)>>,
    pub reject: bool,
}

impl OrderSink for MockOrders {
    fn submit_order(&self, instrument: &str, side: Action, size: f64) -> Result<(), TraderError> {
        if self.reject {
            return Err(TraderError::Order {
                reason: "insufficient balance".into(),
            });
        }
        self.submitted
            .borrow_mut()
            .push((instrument.to_string(), side, size));
        Ok(())
    }
}

pub struct FixedDecision(pub Option<Decision>);

impl DecisionSource for FixedDecision {
    fn decide(&self, _ctx: &DecisionContext<'_>) -> Result<Option<Decision>, TraderError> {
        Ok(self.0.clone())
    }
}

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn at(t: DateTime<Utc>) -> Self {
        Self(Mutex::new(t))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
