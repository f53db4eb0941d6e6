//! Performance metrics over a simulated equity curve.
//!
//! Every bar is one day and crypto markets trade every day, so annualization
//! uses 365 periods per year.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const PERIODS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

pub fn total_return(initial: f64, final_value: f64) -> f64 {
    if initial > 0.0 {
        (final_value - initial) / initial
    } else {
        0.0
    }
}

/// Compound `total_return` earned over `periods` bars to a yearly rate.
pub fn annualized_return(total_return: f64, periods: usize) -> f64 {
    if periods == 0 || !total_return.is_finite() || total_return <= -1.0 {
        return if total_return <= -1.0 && periods > 0 {
            -1.0
        } else {
            0.0
        };
    }
    (1.0 + total_return).powf(PERIODS_PER_YEAR / periods as f64) - 1.0
}

/// Simple returns between consecutive points. A non-positive previous value
/// yields a zero return.
pub fn per_bar_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized Sharpe ratio: mean per-bar excess return over its sample
/// standard deviation, scaled by sqrt(365).
///
/// Zero when there are fewer than two returns or they do not vary.
pub fn sharpe_ratio(curve: &[EquityPoint], risk_free_rate: f64) -> f64 {
    let returns = per_bar_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let per_bar_rf = risk_free_rate / PERIODS_PER_YEAR;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > f64::EPSILON {
        (mean - per_bar_rf) / stddev * PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
