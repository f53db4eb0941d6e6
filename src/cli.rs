//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info_span;

use crate::adapters::csv_adapter::CsvMarketData;
use crate::adapters::decision_file::DecisionFile;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::system_clock::SystemClock;
use crate::domain::account::Account;
use crate::domain::backtest::{BacktestEngine, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, build_crossover, build_log_config, build_pair, build_risk_limits,
};
use crate::domain::decision::Decision;
use crate::domain::error::TraderError;
use crate::domain::indicator_helpers::{annotate, AnnotatedCandle};
use crate::domain::risk::RiskManager;
use crate::domain::strategy::{ExternalDecisions, RiskAdjusted, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataSource;

#[derive(Parser, Debug)]
#[command(
    name = "sigmatrader",
    about = "Indicators, risk checks and backtests for a daily trading cycle"
)]
pub struct Cli {
    /// INI configuration file; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a strategy over a candle file
    Backtest {
        /// CSV candles: timestamp,open,high,low,close,volume
        #[arg(short, long)]
        data: PathBuf,
        /// JSON-lines decisions to replay instead of the moving-average strategy
        #[arg(long)]
        decisions: Option<PathBuf>,
        /// Print the full result (trades, equity curve) as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print candles annotated with the standard indicator set
    Indicators {
        #[arg(short, long)]
        data: PathBuf,
        /// Only the most recent N candles
        #[arg(long, default_value_t = 30)]
        last: usize,
        /// One JSON object per line instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Risk-based position size for a long entry
    Size {
        /// Fraction of equity to lose if the stop is hit, e.g. 0.02
        #[arg(long)]
        risk: f64,
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        stop: f64,
        #[arg(long)]
        equity: f64,
    },
    /// Check the configuration and optionally a decision against risk limits
    Validate {
        /// Decision JSON, e.g. '{"action":"BUY","position_pct":0.3}'
        #[arg(long)]
        decision: Option<String>,
    },
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TraderError> {
    match path {
        Some(path) => FileConfigAdapter::from_file(path),
        None => FileConfigAdapter::from_string(""),
    }
}

/// Load the configuration and install the global subscriber from its
/// `[logging]` section.
pub fn init(cli: &Cli) -> Result<FileConfigAdapter, TraderError> {
    let config = load_config(cli.config.as_deref())?;
    crate::logging::init_logging(&build_log_config(&config)?)?;
    Ok(config)
}

pub fn run(cli: Cli, config: &dyn ConfigPort) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            data,
            decisions,
            json,
        } => run_backtest(config, &data, decisions.as_deref(), json),
        Command::Indicators { data, last, json } => run_indicators(config, &data, last, json),
        Command::Size {
            risk,
            entry,
            stop,
            equity,
        } => run_size(config, risk, entry, stop, equity),
        Command::Validate { decision } => run_validate(config, decision.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn risk_manager(config: &dyn ConfigPort) -> Result<Arc<RiskManager>, TraderError> {
    let limits = build_risk_limits(config)?;
    Ok(Arc::new(
        RiskManager::new(limits, Arc::new(SystemClock)).with_span(info_span!("risk")),
    ))
}

/// Load candles for the configured pair from `data_port` and replay either
/// the configured moving-average strategy or `decisions`, clamped to the
/// configured position limit.
pub fn run_backtest_pipeline(
    data_port: &dyn MarketDataSource,
    config: &dyn ConfigPort,
    decisions: Option<DecisionFile>,
) -> Result<BacktestResult, TraderError> {
    let pair = build_pair(config)?;
    let bt_config = build_backtest_config(config)?;
    let risk = risk_manager(config)?;

    let candles = data_port.get_candles(&pair, usize::MAX)?;
    if candles.is_empty() {
        return Err(TraderError::NoData {
            pair: pair.to_string(),
        });
    }

    let inner: Box<dyn Strategy> = match decisions {
        Some(file) => Box::new(
            ExternalDecisions::new(file, pair.clone()).with_span(info_span!("decisions")),
        ),
        None => Box::new(build_crossover(config)?),
    };
    let strategy = RiskAdjusted::new(inner, risk);

    let engine = BacktestEngine::new(strategy, bt_config)
        .with_span(info_span!("backtest", pair = %pair));
    Ok(engine.run(&candles)?)
}

fn run_backtest(
    config: &dyn ConfigPort,
    data: &Path,
    decisions: Option<&Path>,
    json: bool,
) -> Result<(), TraderError> {
    let decisions = decisions.map(DecisionFile::from_file).transpose()?;
    let result = run_backtest_pipeline(&CsvMarketData::from_file(data.to_path_buf()), config, decisions)?;

    if json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| TraderError::Data { reason: e.to_string() })?;
        println!("{out}");
    } else {
        println!("Strategy: {}", result.strategy);
        println!("Period:   {} .. {}", result.start.date_naive(), result.end.date_naive());
        println!("{result}");
    }
    Ok(())
}

fn format_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

fn indicator_row(a: &AnnotatedCandle) -> String {
    let i = &a.indicators;
    format!(
        "{:<10} {:>12.2} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        a.candle.timestamp.date_naive(),
        a.candle.close,
        format_opt(i.ma5),
        format_opt(i.ma50),
        format_opt(i.ma200),
        format_opt(i.bollinger.map(|b| b.upper)),
        format_opt(i.bollinger.map(|b| b.lower)),
        format_opt(i.rsi),
        format_opt(i.macd.map(|m| m.histogram)),
        format_opt(i.atr),
    )
}

fn run_indicators(
    config: &dyn ConfigPort,
    data: &Path,
    last: usize,
    json: bool,
) -> Result<(), TraderError> {
    let pair = build_pair(config)?;
    let candles = CsvMarketData::from_file(data.to_path_buf()).load(&pair)?;
    let annotated = annotate(&candles);
    let tail = &annotated[annotated.len().saturating_sub(last)..];

    if json {
        for a in tail {
            let line = serde_json::to_string(a).map_err(|e| TraderError::Data { reason: e.to_string() })?;
            println!("{line}");
        }
    } else {
        println!(
            "{:<10} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "date", "close", "ma5", "ma50", "ma200", "bb_upper", "bb_lower", "rsi", "macd_hist", "atr"
        );
        for a in tail {
            println!("{}", indicator_row(a));
        }
    }
    Ok(())
}

fn run_size(
    config: &dyn ConfigPort,
    risk_per_trade: f64,
    entry: f64,
    stop: f64,
    equity: f64,
) -> Result<(), TraderError> {
    let risk = risk_manager(config)?;
    let notional = risk.calculate_position_size(risk_per_trade, entry, stop, equity);
    let units = if entry > 0.0 { notional / entry } else { 0.0 };

    println!("Notional: {notional:.2}");
    println!("Units:    {units:.8}");
    Ok(())
}

fn run_validate(config: &dyn ConfigPort, decision: Option<&str>) -> Result<(), TraderError> {
    let pair = build_pair(config)?;
    let bt = build_backtest_config(config)?;
    let limits = build_risk_limits(config)?;
    let strategy = build_crossover(config)?;
    build_log_config(config)?;

    println!("Pair:      {pair}");
    println!("Capital:   {:.2} (commission {})", bt.initial_capital, bt.commission);
    println!("Strategy:  {}", strategy.name());
    println!(
        "Risk:      max position {:.0}%, max daily loss {:.0}%",
        limits.max_position_pct * 100.0,
        limits.max_daily_loss_pct * 100.0
    );
    println!("Configuration is valid.");

    let Some(raw) = decision else {
        return Ok(());
    };
    let decision = Decision::from_json(raw)?;
    let risk = risk_manager(config)?;
    let account = Account::new(bt.initial_capital);

    match risk.validate_decision(Some(&decision), &account) {
        Ok(()) => {
            println!("Decision is within limits.");
            Ok(())
        }
        Err(violation) => {
            let adjusted = risk.adjust_decision(decision);
            println!("Decision rejected: {violation}");
            println!("Adjusted: {}", adjusted.to_json()?);
            Err(violation.into())
        }
    }
}
