//! Domain error types.

/// Rejected by the risk manager. Callers decide whether to drop, clamp or
/// log-and-continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RiskViolation {
    #[error("maximum position limit exceeded")]
    MaxPositionExceeded,

    #[error("maximum daily loss limit exceeded")]
    MaxDailyLossExceeded,

    #[error("invalid trading decision")]
    InvalidDecision,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("position_pct {0} outside [0, 1]")]
    PositionPctOutOfRange(f64),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("malformed decision: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BacktestError {
    #[error("no candles provided")]
    EmptyInput,
}

/// Top-level error type for sigmatrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {pair}")]
    NoData { pair: String },

    #[error("order rejected: {reason}")]
    Order { reason: String },

    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Risk(#[from] RiskViolation),

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error("logging setup failed: {reason}")]
    Logging { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::Logging { .. } => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Data { .. } | TraderError::Order { .. } => 3,
            TraderError::Decision(_) | TraderError::Risk(_) => 4,
            TraderError::NoData { .. } | TraderError::Backtest(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
