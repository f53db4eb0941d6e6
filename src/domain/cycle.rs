//! One daily trading cycle: fetch, annotate, decide, check risk, order,
//! record.

use std::sync::Arc;

use tracing::{info, warn, Span};

use crate::domain::account::Pair;
use crate::domain::decision::{Action, Decision};
use crate::domain::error::{RiskViolation, TraderError};
use crate::domain::indicator_helpers::{decision_window, CONTEXT_CANDLES, HISTORY_CANDLES};
use crate::domain::risk::RiskManager;
use crate::ports::account_port::{AccountSource, OrderSink};
use crate::ports::data_port::MarketDataSource;
use crate::ports::decision_port::{DecisionContext, DecisionSource};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The decision source had nothing to say.
    NoDecision,
    /// Nothing was ordered. Includes decisions turned into holds by risk
    /// checks.
    Held(Decision),
    /// An order was submitted and recorded.
    Executed { decision: Decision, price: f64 },
}

pub struct TradingCycle<'a> {
    market: &'a dyn MarketDataSource,
    account: &'a dyn AccountSource,
    orders: &'a dyn OrderSink,
    decisions: &'a dyn DecisionSource,
    risk: Arc<RiskManager>,
    span: Span,
}

impl<'a> TradingCycle<'a> {
    pub fn new(
        market: &'a dyn MarketDataSource,
        account: &'a dyn AccountSource,
        orders: &'a dyn OrderSink,
        decisions: &'a dyn DecisionSource,
        risk: Arc<RiskManager>,
    ) -> Self {
        TradingCycle {
            market,
            account,
            orders,
            decisions,
            risk,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn run(&self, pair: &Pair) -> Result<CycleOutcome, TraderError> {
        let _enter = self.span.enter();

        let candles = self.market.get_candles(pair, HISTORY_CANDLES)?;
        let window = decision_window(&candles, CONTEXT_CANDLES);
        let Some(last) = window.last() else {
            return Err(TraderError::NoData {
                pair: pair.to_string(),
            });
        };
        let price = last.candle.close;
        info!(%pair, candles = candles.len(), price, "market data loaded");

        let account = self.account.get_balance(pair)?;
        let position_units = account.units(&pair.base);
        info!(total_equity = account.total_equity, position_units, "account loaded");
        self.risk.set_initial_equity(account.total_equity);

        let ctx = DecisionContext {
            pair,
            candles: &window,
            position_units,
            total_equity: Some(account.total_equity),
        };
        let Some(decision) = self.decisions.decide(&ctx)? else {
            info!("no decision");
            return Ok(CycleOutcome::NoDecision);
        };
        info!(
            action = %decision.action,
            position_pct = decision.position_pct(),
            reason = %decision.reason,
            "decision received"
        );

        let decision = match self.risk.validate_decision(Some(&decision), &account) {
            Err(RiskViolation::MaxPositionExceeded) => {
                warn!("position limit exceeded; clamping decision");
                self.risk.adjust_decision(decision)
            }
            _ => decision,
        };
        // The clamped decision still has to pass the remaining checks.
        let decision = match self.risk.validate_decision(Some(&decision), &account) {
            Ok(()) => decision,
            Err(violation) => {
                warn!(%violation, "decision blocked by risk checks");
                Decision::hold(format!("blocked: {violation}"))
            }
        };

        let decision = self
            .risk
            .size_decision(decision, account.total_equity, position_units);
        let amount = match (decision.action, decision.amount()) {
            (Action::Hold, _) => {
                info!("holding; no order");
                return Ok(CycleOutcome::Held(decision));
            }
            (_, Some(amount)) if amount > 0.0 => amount,
            _ => {
                info!(action = %decision.action, "nothing to trade; no order");
                return Ok(CycleOutcome::Held(decision));
            }
        };

        self.orders
            .submit_order(&pair.instrument(), decision.action, amount)?;
        info!(action = %decision.action, amount, "order submitted");

        // Realized P&L is only known for sells of a position with a known
        // entry price.
        let pnl = match (decision.action, account.asset(&pair.base)) {
            (Action::Sell, Some(held)) if held.avg_entry_price > 0.0 => {
                amount * (price - held.avg_entry_price)
            }
            _ => 0.0,
        };
        self.risk
            .record_trade(decision.action, amount, price, pnl, account.total_equity);

        Ok(CycleOutcome::Executed { decision, price })
    }
}
