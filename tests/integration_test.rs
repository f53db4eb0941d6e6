//! End-to-end tests across indicators, risk manager, strategies, the backtest
//! engine and the trading cycle.

mod common;

use std::sync::Arc;
use std::thread;

use approx::assert_relative_eq;
use chrono::Duration;
use common::*;
use proptest::prelude::*;
use sigmatrader::domain::account::{Account, Pair};
use sigmatrader::domain::backtest::{BacktestConfig, BacktestEngine};
use sigmatrader::domain::cycle::{CycleOutcome, TradingCycle};
use sigmatrader::domain::decision::{Action, Decision};
use sigmatrader::domain::error::{BacktestError, RiskViolation, TraderError};
use sigmatrader::domain::indicator::{atr, ema, macd, rsi, sma, stochastic};
use sigmatrader::domain::indicator_helpers::{annotate, HISTORY_CANDLES};
use sigmatrader::domain::risk::{RiskLimits, RiskManager};
use sigmatrader::domain::strategy::{MovingAverageCrossover, RiskAdjusted};

fn limits() -> RiskLimits {
    RiskLimits {
        max_position_pct: 0.5,
        max_daily_loss_pct: 0.05,
        stop_loss_enabled: true,
        take_profit_enabled: true,
    }
}

fn manager() -> (Arc<RiskManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at(day(0) + Duration::hours(9)));
    let mgr = Arc::new(RiskManager::new(limits(), clock.clone()));
    (mgr, clock)
}

mod indicators {
    use super::*;

    #[test]
    fn sma_of_one_to_five() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn ema_seed_and_first_step() {
        let out = ema(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], 3.0);
    }

    #[test]
    fn rsi_extremes() {
        let rising: Vec<f64> = (1..=20).map(f64::from).collect();
        assert!(rsi(&rising, 14).iter().all(|&v| (v - 100.0).abs() < 1e-9));

        let falling: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        assert!(rsi(&falling, 14).iter().all(|&v| v.abs() < 1e-9));
    }

    #[test]
    fn short_series_yield_nothing() {
        let short = [1.0, 2.0, 3.0];
        assert!(sma(&short, 5).is_empty());
        assert!(ema(&short, 5).is_empty());
        assert!(rsi(&short, 14).is_empty());
        assert!(macd(&short, 12, 26, 9).is_empty());
        assert!(atr(&short, &short, &short, 14).is_empty());
        assert!(stochastic(&short, &short, &short, 14, 3).is_empty());
    }

    #[test]
    fn annotate_full_history() {
        let annotated = annotate(&trending(HISTORY_CANDLES, 1.0));
        let last = &annotated.last().unwrap().indicators;
        assert!(last.ma200.is_some());
        assert!(last.rsi.unwrap() > 99.0);
        assert!(last.stochastic.unwrap().k > 90.0);
        assert!(last.macd.unwrap().line > 0.0);
    }

    proptest! {
        #[test]
        fn rsi_and_stochastic_stay_in_range(
            closes in prop::collection::vec(1.0f64..1_000.0, 20..120),
        ) {
            let highs: Vec<f64> = closes.iter().map(|c| c * 1.01).collect();
            let lows: Vec<f64> = closes.iter().map(|c| c * 0.99).collect();

            for v in rsi(&closes, 14) {
                prop_assert!((0.0..=100.0).contains(&v));
            }
            for s in stochastic(&highs, &lows, &closes, 14, 3) {
                prop_assert!((0.0..=100.0).contains(&s.k));
                prop_assert!((0.0..=100.0).contains(&s.d));
            }
        }
    }
}

mod risk {
    use super::*;

    #[test]
    fn oversized_decision_rejected_then_clamped() {
        let (mgr, _) = manager();
        mgr.set_initial_equity(10_000.0);
        let d = Decision::new(Action::Buy, 0.8).unwrap();

        assert_eq!(
            mgr.validate_decision(Some(&d), &Account::new(10_000.0)),
            Err(RiskViolation::MaxPositionExceeded)
        );
        let adjusted = mgr.adjust_decision(d);
        assert_eq!(adjusted.position_pct(), 0.5);
        assert_eq!(mgr.validate_decision(Some(&adjusted), &Account::new(10_000.0)), Ok(()));
    }

    #[test]
    fn position_sizing_example() {
        let (mgr, _) = manager();
        assert_relative_eq!(
            mgr.calculate_position_size(0.02, 50_000.0, 48_000.0, 10_000.0),
            5_000.0
        );
    }

    #[test]
    fn daily_pnl_rolls_over_at_midnight_utc() {
        let (mgr, clock) = manager();
        mgr.record_trade(Action::Buy, 100.0, 50_000.0, 0.0, 10_000.0);
        mgr.record_trade(Action::Sell, 50.0, 52_000.0, 100.0, 10_100.0);
        assert_relative_eq!(mgr.get_daily_pnl(), 100.0);

        clock.advance(Duration::hours(15));
        assert_eq!(mgr.get_daily_pnl(), 0.0);
        assert_eq!(mgr.get_trade_history(0).len(), 2);
    }

    #[test]
    fn concurrent_cycles_share_one_manager() {
        let (mgr, _) = manager();
        mgr.set_initial_equity(100_000.0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mgr = Arc::clone(&mgr);
                thread::spawn(move || {
                    for _ in 0..250 {
                        mgr.record_trade(Action::Sell, 1.0, 10.0, -1.0, 99_000.0);
                        let d = Decision::new(Action::Buy, 0.1).unwrap();
                        let _ = mgr.validate_decision(Some(&d), &Account::default());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(mgr.get_trade_history(0).len(), 1_000);
        assert_relative_eq!(mgr.get_daily_pnl(), -1_000.0);
        let d = Decision::new(Action::Buy, 0.1).unwrap();
        assert_eq!(mgr.validate_decision(Some(&d), &Account::default()), Ok(()));
    }
}

mod backtest {
    use super::*;

    #[test]
    fn empty_series_errors() {
        let engine = BacktestEngine::new(MovingAverageCrossover::new(5, 20), BacktestConfig::default());
        assert_eq!(engine.run(&[]).unwrap_err(), BacktestError::EmptyInput);
    }

    #[test]
    fn crossover_round_trip_on_peak() {
        let config = BacktestConfig {
            commission: 0.0,
            ..BacktestConfig::default()
        };
        let engine = BacktestEngine::new(MovingAverageCrossover::new(5, 20), config);
        let result = engine.run(&peak(200)).unwrap();

        assert!(result.total_trades >= 2);
        assert_eq!(result.trades[0].action, Action::Buy);
        assert!(result.trades.iter().any(|t| t.action == Action::Sell));
        assert_eq!(result.winning_trades + result.losing_trades, 1);
        assert!(result.max_drawdown > 0.0);
        assert_eq!(result.equity_curve.len(), 200 - 30);
    }

    #[test]
    fn risk_adjusted_strategy_keeps_half_in_cash() {
        let (mgr, _) = manager();
        let strategy = RiskAdjusted::new(MovingAverageCrossover::new(5, 20), mgr);
        let config = BacktestConfig {
            commission: 0.0,
            ..BacktestConfig::default()
        };
        let candles = trending(60, 1.0);
        let result = BacktestEngine::new(strategy, config).run(&candles).unwrap();

        // first bar after warm-up buys with half of the capital, the next
        // golden-cross bars are holds because the position is open
        assert_eq!(result.trades.len(), 1);
        let buy = &result.trades[0];
        assert_relative_eq!(buy.amount * buy.price, 5_000.0, max_relative = 1e-12);
        assert!(result.final_capital > 10_000.0);
    }

    #[test]
    fn risk_adjusted_crossover_reenters_after_full_exit() {
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        closes.extend((1..=20).map(|i| 159.0 - i as f64));
        closes.extend((1..=60).map(|i| 139.0 + i as f64));
        let candles = make_candles(&closes);

        let (mgr, _) = manager();
        let strategy = RiskAdjusted::new(MovingAverageCrossover::new(5, 20), mgr);
        let result = BacktestEngine::new(strategy, BacktestConfig::default())
            .run(&candles)
            .unwrap();

        let actions: Vec<Action> = result.trades.iter().map(|t| t.action).collect();
        assert_eq!(actions, vec![Action::Buy, Action::Sell, Action::Buy]);
    }

    #[test]
    fn report_contains_summary_block() {
        let engine = BacktestEngine::new(MovingAverageCrossover::new(5, 20), BacktestConfig::default());
        let report = engine.run(&trending(100, 0.5)).unwrap().to_string();
        assert!(report.contains("=== Backtest Report ==="));
        assert!(report.contains("Sharpe Ratio:"));
    }
}

mod cycle {
    use super::*;

    fn pair() -> Pair {
        Pair::new("BTC", "USDT")
    }

    #[test]
    fn full_cycle_submits_clamped_order() {
        let market = MockMarket::new().with_candles(pair(), trending(300, 1.0));
        let account = MockAccount(Account::new(10_000.0));
        let orders = MockOrders::default();
        let source = FixedDecision(Some(Decision::new(Action::Buy, 0.8).unwrap()));
        let (mgr, _) = manager();

        let cycle = TradingCycle::new(&market, &account, &orders, &source, Arc::clone(&mgr));
        let outcome = cycle.run(&pair()).unwrap();

        assert!(matches!(outcome, CycleOutcome::Executed { .. }));
        assert_eq!(
            *orders.submitted.borrow(),
            vec![("BTC-USDT".to_string(), Action::Buy, 5_000.0)]
        );
        assert_eq!(mgr.get_trade_history(0).len(), 1);
    }

    #[test]
    fn order_failure_is_not_recorded() {
        let market = MockMarket::new().with_candles(pair(), trending(300, 1.0));
        let account = MockAccount(Account::new(10_000.0));
        let orders = MockOrders {
            reject: true,
            ..MockOrders::default()
        };
        let source = FixedDecision(Some(Decision::new(Action::Buy, 0.2).unwrap()));
        let (mgr, _) = manager();

        let cycle = TradingCycle::new(&market, &account, &orders, &source, Arc::clone(&mgr));
        assert!(matches!(cycle.run(&pair()), Err(TraderError::Order { .. })));
        assert!(mgr.get_trade_history(0).is_empty());
    }

    #[test]
    fn unknown_pair_has_no_data() {
        let market = MockMarket::new();
        let account = MockAccount(Account::new(10_000.0));
        let orders = MockOrders::default();
        let source = FixedDecision(None);
        let (mgr, _) = manager();

        let cycle = TradingCycle::new(&market, &account, &orders, &source, mgr);
        assert!(matches!(cycle.run(&pair()), Err(TraderError::NoData { .. })));
    }
}
