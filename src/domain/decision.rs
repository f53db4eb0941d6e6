//! Trading decisions exchanged between strategies, the risk manager and the
//! simulation engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DecisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

impl FromStr for Action {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            _ => Err(DecisionError::UnknownAction(s.to_string())),
        }
    }
}

/// A trading decision.
///
/// `position_pct` is always within [0, 1]. `amount` is the sized notional and
/// is only ever set by the risk manager; it is written on serialization but
/// ignored when parsing external input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecision")]
pub struct Decision {
    pub action: Action,
    position_pct: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub reason: String,
    amount: Option<f64>,
}

#[derive(Deserialize)]
struct RawDecision {
    action: Action,
    #[serde(default)]
    position_pct: f64,
    #[serde(default)]
    stop_loss_price: f64,
    #[serde(default)]
    take_profit_price: f64,
    #[serde(default)]
    reason: String,
}

impl TryFrom<RawDecision> for Decision {
    type Error = DecisionError;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        let mut decision = Decision::new(raw.action, raw.position_pct)?;
        decision.stop_loss_price = raw.stop_loss_price;
        decision.take_profit_price = raw.take_profit_price;
        decision.reason = raw.reason;
        Ok(decision)
    }
}

impl Decision {
    pub fn new(action: Action, position_pct: f64) -> Result<Self, DecisionError> {
        if !(0.0..=1.0).contains(&position_pct) {
            return Err(DecisionError::PositionPctOutOfRange(position_pct));
        }
        Ok(Decision {
            action,
            position_pct,
            stop_loss_price: 0.0,
            take_profit_price: 0.0,
            reason: String::new(),
            amount: None,
        })
    }

    pub fn hold(reason: impl Into<String>) -> Self {
        Decision {
            action: Action::Hold,
            position_pct: 0.0,
            stop_loss_price: 0.0,
            take_profit_price: 0.0,
            reason: reason.into(),
            amount: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_stop_loss(mut self, price: f64) -> Self {
        self.stop_loss_price = price;
        self
    }

    pub fn with_take_profit(mut self, price: f64) -> Self {
        self.take_profit_price = price;
        self
    }

    pub fn position_pct(&self) -> f64 {
        self.position_pct
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }

    /// Lower `position_pct` to `max` when above it.
    pub(crate) fn clamped_to(mut self, max: f64) -> Self {
        if self.position_pct > max {
            self.position_pct = max.clamp(0.0, 1.0);
        }
        self
    }

    pub(crate) fn sized(mut self, amount: Option<f64>) -> Self {
        self.amount = amount;
        self
    }

    pub fn from_json(s: &str) -> Result<Self, DecisionError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, DecisionError> {
        Ok(serde_json::to_string(self)?)
    }
}
