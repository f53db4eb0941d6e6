//! Core domain types and logic.

pub mod account;
pub mod backtest;
pub mod candle;
pub mod config_validation;
pub mod cycle;
pub mod decision;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod metrics;
pub mod portfolio;
pub mod risk;
pub mod strategy;
