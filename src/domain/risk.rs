//! Risk manager: position limits, daily loss budget, sizing and the trade log.
//!
//! All mutable state lives in a single `RwLock<RiskState>`:
//! - `set_initial_equity` and `record_trade` take the write lock, so they
//!   exclude every reader and every other writer;
//! - `validate_decision`, `initial_equity`, `get_daily_pnl` and
//!   `get_trade_history` take the read lock and may run concurrently.
//!
//! The daily P&L window is keyed by [`day_bucket`]. Writers roll the window
//! forward in the same critical section as their mutation. Readers never
//! mutate; they treat a stale window as a zero daily P&L.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn, Span};

use crate::domain::account::Account;
use crate::domain::decision::{Action, Decision};
use crate::domain::error::RiskViolation;
use crate::ports::clock_port::Clock;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    pub max_position_pct: f64,
    pub max_daily_loss_pct: f64,
    pub stop_loss_enabled: bool,
    pub take_profit_enabled: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            max_position_pct: 0.5,
            max_daily_loss_pct: 0.05,
            stop_loss_enabled: true,
            take_profit_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub amount: f64,
    pub price: f64,
    pub pnl: f64,
    pub total_equity: f64,
}

/// UTC calendar day a timestamp belongs to.
pub fn day_bucket(t: DateTime<Utc>) -> NaiveDate {
    t.date_naive()
}

#[derive(Debug)]
struct RiskState {
    initial_equity: f64,
    daily_pnl: f64,
    daily_window: NaiveDate,
    trades: Vec<TradeRecord>,
}

impl RiskState {
    fn daily_pnl_on(&self, today: NaiveDate) -> f64 {
        if today == self.daily_window {
            self.daily_pnl
        } else {
            0.0
        }
    }

    /// Returns true when the window moved.
    fn roll_to(&mut self, today: NaiveDate) -> bool {
        if today == self.daily_window {
            return false;
        }
        self.daily_pnl = 0.0;
        self.daily_window = today;
        true
    }
}

pub struct RiskManager {
    limits: RiskLimits,
    clock: Arc<dyn Clock>,
    state: RwLock<RiskState>,
    span: Span,
}

impl RiskManager {
    pub fn new(limits: RiskLimits, clock: Arc<dyn Clock>) -> Self {
        let today = day_bucket(clock.now());
        RiskManager {
            limits,
            clock,
            state: RwLock::new(RiskState {
                initial_equity: 0.0,
                daily_pnl: 0.0,
                daily_window: today,
                trades: Vec::new(),
            }),
            span: Span::none(),
        }
    }

    /// Emit this manager's events inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    // A panic while holding the lock cannot leave RiskState half-written:
    // every mutation is a single field store or a Vec push.
    fn read(&self) -> RwLockReadGuard<'_, RiskState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RiskState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn today(&self) -> NaiveDate {
        day_bucket(self.clock.now())
    }

    pub fn set_initial_equity(&self, equity: f64) {
        let _enter = self.span.enter();
        let today = self.today();
        let mut state = self.write();
        if state.roll_to(today) {
            info!(%today, "daily P&L window reset");
        }
        state.initial_equity = equity;
        debug!(equity, "initial equity set");
    }

    pub fn initial_equity(&self) -> f64 {
        self.read().initial_equity
    }

    /// Check a decision against the configured limits without changing it.
    pub fn validate_decision(
        &self,
        decision: Option<&Decision>,
        account: &Account,
    ) -> Result<(), RiskViolation> {
        let _enter = self.span.enter();
        let today = self.today();
        let state = self.read();

        let Some(decision) = decision else {
            warn!("no decision to validate");
            return Err(RiskViolation::InvalidDecision);
        };

        if decision.position_pct() > self.limits.max_position_pct {
            warn!(
                position_pct = decision.position_pct(),
                max_position_pct = self.limits.max_position_pct,
                "position limit exceeded"
            );
            return Err(RiskViolation::MaxPositionExceeded);
        }

        if state.initial_equity > 0.0 {
            let loss_ratio = -state.daily_pnl_on(today) / state.initial_equity;
            if loss_ratio >= self.limits.max_daily_loss_pct {
                warn!(
                    loss_ratio,
                    max_daily_loss_pct = self.limits.max_daily_loss_pct,
                    "daily loss limit reached"
                );
                return Err(RiskViolation::MaxDailyLossExceeded);
            }
        }

        debug!(
            action = %decision.action,
            position_pct = decision.position_pct(),
            total_equity = account.total_equity,
            "decision within limits"
        );
        Ok(())
    }

    /// Clamp `position_pct` down to the configured maximum.
    pub fn adjust_decision(&self, decision: Decision) -> Decision {
        decision.clamped_to(self.limits.max_position_pct)
    }

    /// Notional to commit so that hitting the stop loses `risk_per_trade` of
    /// equity, capped at `max_position_pct` of equity. Long only: returns 0
    /// unless `stop_loss_price < entry_price` and all prices are positive.
    pub fn calculate_position_size(
        &self,
        risk_per_trade: f64,
        entry_price: f64,
        stop_loss_price: f64,
        total_equity: f64,
    ) -> f64 {
        if entry_price <= 0.0 || stop_loss_price <= 0.0 || total_equity <= 0.0 {
            return 0.0;
        }

        let risk_per_unit = entry_price - stop_loss_price;
        if risk_per_unit <= 0.0 {
            return 0.0;
        }

        let risk_amount = total_equity * risk_per_trade;
        let units = risk_amount / risk_per_unit;
        let notional = units * entry_price;

        notional.min(total_equity * self.limits.max_position_pct)
    }

    /// Attach the order amount implied by `position_pct`: quote notional of
    /// total equity for buys, base units of the current holding for sells.
    pub fn size_decision(&self, decision: Decision, total_equity: f64, position_units: f64) -> Decision {
        let pct = decision.position_pct();
        let amount = match decision.action {
            Action::Buy => Some(total_equity.max(0.0) * pct),
            Action::Sell => Some(position_units.max(0.0) * pct),
            Action::Hold => None,
        };
        decision.sized(amount)
    }

    pub fn record_trade(&self, action: Action, amount: f64, price: f64, pnl: f64, total_equity: f64) {
        let _enter = self.span.enter();
        let now = self.clock.now();
        let mut state = self.write();
        if state.roll_to(day_bucket(now)) {
            info!(today = %day_bucket(now), "daily P&L window reset");
        }

        state.trades.push(TradeRecord {
            timestamp: now,
            action,
            amount,
            price,
            pnl,
            total_equity,
        });
        state.daily_pnl += pnl;

        info!(%action, amount, price, pnl, daily_pnl = state.daily_pnl, "trade recorded");
    }

    pub fn should_stop_loss(&self, current_price: f64, stop_loss_price: f64) -> bool {
        self.limits.stop_loss_enabled && current_price <= stop_loss_price
    }

    pub fn should_take_profit(&self, current_price: f64, take_profit_price: f64) -> bool {
        self.limits.take_profit_enabled && current_price >= take_profit_price
    }

    pub fn get_daily_pnl(&self) -> f64 {
        let today = self.today();
        self.read().daily_pnl_on(today)
    }

    /// The most recent `limit` records, oldest first. `limit == 0` means all.
    pub fn get_trade_history(&self, limit: usize) -> Vec<TradeRecord> {
        let state = self.read();
        let len = state.trades.len();
        let take = if limit == 0 { len } else { limit.min(len) };
        state.trades[len - take..].to_vec()
    }
}
