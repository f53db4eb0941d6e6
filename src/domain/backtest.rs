//! Backtest engine: replays a strategy over a candle series.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, Span};

use crate::domain::candle::{normalize_ascending, Candle};
use crate::domain::decision::Action;
use crate::domain::error::BacktestError;
use crate::domain::metrics::{self, EquityPoint};
use crate::domain::portfolio::Portfolio;
use crate::domain::strategy::Strategy;

pub const DEFAULT_WARMUP_BARS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fee rate applied to each fill, e.g. 0.001 for 0.1%.
    pub commission: f64,
    /// Bars skipped before the strategy is first consulted.
    pub warmup_bars: usize,
    /// Annual rate used by the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission: 0.001,
            warmup_bars: DEFAULT_WARMUP_BARS,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub price: f64,
    /// Units bought or sold.
    pub amount: f64,
    pub pnl: f64,
    /// Marked equity on the bar the trade happened.
    pub total_equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub sharpe_ratio: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl fmt::Display for BacktestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtest Report ===")?;
        writeln!(f, "Strategy Performance:")?;
        writeln!(f, "  Initial Capital: ${:.2}", self.initial_capital)?;
        writeln!(f, "  Final Capital:   ${:.2}", self.final_capital)?;
        writeln!(f, "  Total Return:    {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "  Annualized:      {:.2}%", self.annualized_return * 100.0)?;
        writeln!(f, "  Max Drawdown:    {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Trading Statistics:")?;
        writeln!(f, "  Total Trades:    {}", self.total_trades)?;
        writeln!(f, "  Winning Trades:  {}", self.winning_trades)?;
        writeln!(f, "  Losing Trades:   {}", self.losing_trades)?;
        writeln!(f, "  Win Rate:        {:.2}%", self.win_rate * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Risk Metrics:")?;
        writeln!(f, "  Sharpe Ratio:    {:.2}", self.sharpe_ratio)?;
        write!(f, "=======================")
    }
}

pub struct BacktestEngine<S> {
    strategy: S,
    config: BacktestConfig,
    span: Span,
}

impl<S: Strategy> BacktestEngine<S> {
    pub fn new(strategy: S, config: BacktestConfig) -> Self {
        BacktestEngine {
            strategy,
            config,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run(&self, candles: &[Candle]) -> Result<BacktestResult, BacktestError> {
        let _enter = self.span.enter();
        let candles = normalize_ascending(candles);
        let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
            return Err(BacktestError::EmptyInput);
        };

        let strategy = self.strategy.name();
        info!(
            strategy = %strategy,
            bars = candles.len(),
            warmup = self.config.warmup_bars,
            "backtest started"
        );

        let commission = self.config.commission;
        let mut portfolio = Portfolio::new(self.config.initial_capital);
        let mut trades = Vec::new();
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;

        for i in self.config.warmup_bars..candles.len() {
            let bar = &candles[i];
            let equity = portfolio.mark(bar.timestamp, bar.close);

            let Some(decision) = self.strategy.analyze(&candles[..=i], portfolio.units) else {
                continue;
            };

            let pct = decision.position_pct();
            let fill = match decision.action {
                Action::Buy => portfolio.buy(bar.close, pct, commission),
                Action::Sell => portfolio.sell(bar.close, pct, commission),
                Action::Hold => None,
            };
            let Some(fill) = fill else {
                continue;
            };

            if decision.action == Action::Sell {
                if fill.pnl > 0.0 {
                    winning_trades += 1;
                } else {
                    losing_trades += 1;
                }
            }

            debug!(
                timestamp = %bar.timestamp,
                action = %decision.action,
                price = bar.close,
                units = fill.units,
                pnl = fill.pnl,
                reason = %decision.reason,
                "fill"
            );
            trades.push(Trade {
                timestamp: bar.timestamp,
                action: decision.action,
                price: bar.close,
                amount: fill.units,
                pnl: fill.pnl,
                total_equity: equity,
            });
        }

        let bars_processed = portfolio.equity_curve.len();
        let initial_capital = self.config.initial_capital;
        let final_capital = portfolio.equity(last.close);
        let total_return = metrics::total_return(initial_capital, final_capital);
        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let result = BacktestResult {
            strategy,
            start: first.timestamp,
            end: last.timestamp,
            initial_capital,
            final_capital,
            total_return,
            annualized_return: metrics::annualized_return(total_return, bars_processed),
            max_drawdown: portfolio.max_drawdown,
            win_rate,
            total_trades,
            winning_trades,
            losing_trades,
            sharpe_ratio: metrics::sharpe_ratio(
                &portfolio.equity_curve,
                self.config.risk_free_rate,
            ),
            trades,
            equity_curve: portfolio.equity_curve,
        };

        info!(
            final_capital = result.final_capital,
            total_return = result.total_return,
            trades = result.total_trades,
            "backtest finished"
        );
        Ok(result)
    }
}
