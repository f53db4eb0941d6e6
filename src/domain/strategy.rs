//! Decision strategies replayed by the backtest engine.

use std::sync::Arc;

use tracing::{warn, Span};

use crate::domain::account::Pair;
use crate::domain::candle::Candle;
use crate::domain::decision::{Action, Decision};
use crate::domain::indicator::sma;
use crate::domain::indicator_helpers::{decision_window, CONTEXT_CANDLES, HISTORY_CANDLES};
use crate::domain::risk::RiskManager;
use crate::ports::decision_port::{DecisionContext, DecisionSource};

pub trait Strategy {
    fn name(&self) -> String;

    /// Decide on the last candle of `window` (ascending, ending at the bar
    /// being evaluated). `None` means no opinion, e.g. not enough history.
    fn analyze(&self, window: &[Candle], position_units: f64) -> Option<Decision>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn analyze(&self, window: &[Candle], position_units: f64) -> Option<Decision> {
        (**self).analyze(window, position_units)
    }
}

/// Fully in when the short average is above the long one, fully out when
/// below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageCrossover {
    pub short_period: usize,
    pub long_period: usize,
}

impl MovingAverageCrossover {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        MovingAverageCrossover {
            short_period,
            long_period,
        }
    }
}

fn trailing_mean(window: &[Candle], period: usize) -> Option<f64> {
    let start = window.len().checked_sub(period)?;
    let closes: Vec<f64> = window[start..].iter().map(|c| c.close).collect();
    sma(&closes, period).last().copied()
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> String {
        format!("SimpleMA({},{})", self.short_period, self.long_period)
    }

    fn analyze(&self, window: &[Candle], position_units: f64) -> Option<Decision> {
        if window.len() < self.long_period {
            return None;
        }

        let short = trailing_mean(window, self.short_period)?;
        let long = trailing_mean(window, self.long_period)?;

        let decision = if short > long && position_units == 0.0 {
            Decision::new(Action::Buy, 1.0).ok()?.with_reason("Golden cross detected")
        } else if short < long && position_units > 0.0 {
            Decision::new(Action::Sell, 1.0).ok()?.with_reason("Death cross detected")
        } else {
            Decision::hold("No signal")
        };
        Some(decision)
    }
}

/// Replays an external decision source bar by bar, giving it the same
/// annotated context it would see in a live cycle.
pub struct ExternalDecisions<D> {
    source: D,
    pair: Pair,
    span: Span,
}

impl<D: DecisionSource> ExternalDecisions<D> {
    pub fn new(source: D, pair: Pair) -> Self {
        ExternalDecisions {
            source,
            pair,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl<D: DecisionSource> Strategy for ExternalDecisions<D> {
    fn name(&self) -> String {
        format!("External({})", self.pair)
    }

    fn analyze(&self, window: &[Candle], position_units: f64) -> Option<Decision> {
        let _enter = self.span.enter();
        let history = &window[window.len().saturating_sub(HISTORY_CANDLES)..];
        let candles = decision_window(history, CONTEXT_CANDLES);
        let ctx = DecisionContext {
            pair: &self.pair,
            candles: &candles,
            position_units,
            total_equity: None,
        };

        match self.source.decide(&ctx) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(error = %err, "decision source failed; skipping bar");
                None
            }
        }
    }
}

/// Clamps the inner strategy's buys to the risk manager's position limit.
/// Sells pass through unchanged so a full exit closes the position.
pub struct RiskAdjusted<S> {
    inner: S,
    risk: Arc<RiskManager>,
}

impl<S: Strategy> RiskAdjusted<S> {
    pub fn new(inner: S, risk: Arc<RiskManager>) -> Self {
        RiskAdjusted { inner, risk }
    }
}

impl<S: Strategy> Strategy for RiskAdjusted<S> {
    fn name(&self) -> String {
        format!(
            "{} [max position {:.0}%]",
            self.inner.name(),
            self.risk.limits().max_position_pct * 100.0
        )
    }

    fn analyze(&self, window: &[Candle], position_units: f64) -> Option<Decision> {
        self.inner
            .analyze(window, position_units)
            .map(|d| match d.action {
                Action::Buy => self.risk.adjust_decision(d),
                _ => d,
            })
    }
}
