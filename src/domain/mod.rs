//! Core domain types and logic.

pub mod ohlcv;
pub mod timeframe;
pub mod indicator;
pub mod readings;
pub mod strategy;
pub mod scoring;
pub mod position;
pub mod decision;
pub mod ledger;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod simulation;
pub mod batch;
pub mod error;
