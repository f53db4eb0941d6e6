//! External decision source port (e.g. a language-model advisor).

use crate::domain::account::Pair;
use crate::domain::decision::Decision;
use crate::domain::error::TraderError;
use crate::domain::indicator_helpers::AnnotatedCandle;

/// What a decision source gets to see for one decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub pair: &'a Pair,
    /// Most recent candles, oldest first, with indicators attached.
    pub candles: &'a [AnnotatedCandle],
    pub position_units: f64,
    /// Unknown while replaying history.
    pub total_equity: Option<f64>,
}

pub trait DecisionSource {
    /// `Ok(None)` means the source has nothing to say for this context.
    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<Decision>, TraderError>;
}
