//! Builds typed settings from a [`ConfigPort`], rejecting out-of-range values.
//!
//! Missing keys fall back to defaults; present but malformed or out-of-range
//! keys are errors.

use crate::domain::account::Pair;
use crate::domain::backtest::{BacktestConfig, DEFAULT_WARMUP_BARS};
use crate::domain::error::TraderError;
use crate::domain::risk::RiskLimits;
use crate::domain::strategy::MovingAverageCrossover;
use crate::logging::{LogConfig, LogFormat};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_PAIR: &str = "BTC-USDT";
pub const DEFAULT_SHORT_PERIOD: usize = 5;
pub const DEFAULT_LONG_PERIOD: usize = 20;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
    allow_zero: bool,
    allow_one: bool,
) -> Result<f64, TraderError> {
    let value = config.require_double(section, key, default)?;
    let low_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    let high_ok = if allow_one { value <= 1.0 } else { value < 1.0 };
    if !(low_ok && high_ok) {
        let range = format!(
            "{}0, 1{}",
            if allow_zero { "[" } else { "(" },
            if allow_one { "]" } else { ")" }
        );
        return Err(invalid(section, key, format!("{value} outside {range}")));
    }
    Ok(value)
}

fn require_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TraderError> {
    let value = config.require_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{value} must not be negative")))
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TraderError> {
    let defaults = BacktestConfig::default();

    let initial_capital = config.require_double("backtest", "initial_capital", defaults.initial_capital)?;
    if !(initial_capital > 0.0 && initial_capital.is_finite()) {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }

    let warmup_bars = require_count(config, "backtest", "warmup_bars", DEFAULT_WARMUP_BARS)?;
    if warmup_bars < DEFAULT_WARMUP_BARS {
        return Err(invalid(
            "backtest",
            "warmup_bars",
            format!("warmup_bars must be at least {DEFAULT_WARMUP_BARS}"),
        ));
    }

    Ok(BacktestConfig {
        initial_capital,
        commission: require_fraction(config, "backtest", "commission", defaults.commission, true, false)?,
        warmup_bars,
        risk_free_rate: require_fraction(
            config,
            "backtest",
            "risk_free_rate",
            defaults.risk_free_rate,
            true,
            false,
        )?,
    })
}

pub fn build_risk_limits(config: &dyn ConfigPort) -> Result<RiskLimits, TraderError> {
    let defaults = RiskLimits::default();
    Ok(RiskLimits {
        max_position_pct: require_fraction(
            config,
            "risk",
            "max_position_pct",
            defaults.max_position_pct,
            false,
            true,
        )?,
        max_daily_loss_pct: require_fraction(
            config,
            "risk",
            "max_daily_loss_pct",
            defaults.max_daily_loss_pct,
            false,
            true,
        )?,
        stop_loss_enabled: config.require_bool("risk", "stop_loss_enabled", defaults.stop_loss_enabled)?,
        take_profit_enabled: config.require_bool(
            "risk",
            "take_profit_enabled",
            defaults.take_profit_enabled,
        )?,
    })
}

pub fn build_crossover(config: &dyn ConfigPort) -> Result<MovingAverageCrossover, TraderError> {
    let short = require_count(config, "strategy", "short_period", DEFAULT_SHORT_PERIOD)?;
    let long = require_count(config, "strategy", "long_period", DEFAULT_LONG_PERIOD)?;

    if short == 0 {
        return Err(invalid("strategy", "short_period", "short_period must be at least 1"));
    }
    if long <= short {
        return Err(invalid(
            "strategy",
            "long_period",
            format!("long_period ({long}) must exceed short_period ({short})"),
        ));
    }
    Ok(MovingAverageCrossover::new(short, long))
}

pub fn build_pair(config: &dyn ConfigPort) -> Result<Pair, TraderError> {
    config
        .get_string("trading", "pair")
        .unwrap_or_else(|| DEFAULT_PAIR.to_string())
        .parse()
}

pub fn build_log_config(config: &dyn ConfigPort) -> Result<LogConfig, TraderError> {
    let defaults = LogConfig::default();
    let level = config.get_string("logging", "level").unwrap_or(defaults.level);
    if !matches!(
        level.trim().to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) && !level.contains('=')
    {
        return Err(invalid("logging", "level", format!("unknown level {level:?}")));
    }

    let format = match config.get_string("logging", "format") {
        None => LogFormat::default(),
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| invalid("logging", "format", reason))?,
    };

    Ok(LogConfig {
        level: level.trim().to_string(),
        format,
    })
}
