//! Core domain types and logic.

pub mod daily_record;
pub mod money;
pub mod universe;
pub mod series;
pub mod strategy;
pub mod portfolio;
pub mod corporate_actions;
pub mod momentum;
pub mod rotation;
pub mod valuation;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
