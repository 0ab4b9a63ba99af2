//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::GemtraderError;
use crate::domain::universe::{RotationUniverse, parse_instruments};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const STRATEGY_GEM: &str = "gem";
pub const STRATEGY_SINGLE_ALLOCATION: &str = "single_allocation";

pub const SOURCE_SQLITE: &str = "sqlite";
pub const SOURCE_CSV: &str = "csv";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    validate_strategy_kind(config)?;
    validate_initial_amount(config)?;
    validate_dates(config)?;
    validate_data_source(config)?;
    reinvest_dividends(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    validate_strategy_section(config, &strategy_kind(config)?)
}

/// Validates the section of strategy `kind`, which may differ from the one
/// named in `[backtest] strategy`.
pub fn validate_strategy_section(config: &dyn ConfigPort, kind: &str) -> Result<(), GemtraderError> {
    match parse_strategy_kind(kind)?.as_str() {
        STRATEGY_GEM => {
            validate_lookback(config)?;
            rotation_universe(config)?;
            Ok(())
        }
        _ => {
            config.require_string(STRATEGY_SINGLE_ALLOCATION, "instrument")?;
            Ok(())
        }
    }
}

/// Lower-cased `[backtest] strategy`, defaulting to `gem`.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<String, GemtraderError> {
    match config.get_string("backtest", "strategy") {
        Some(kind) => parse_strategy_kind(&kind),
        None => Ok(STRATEGY_GEM.to_string()),
    }
}

pub fn parse_strategy_kind(kind: &str) -> Result<String, GemtraderError> {
    let kind = kind.trim().to_lowercase();
    match kind.as_str() {
        STRATEGY_GEM | STRATEGY_SINGLE_ALLOCATION => Ok(kind),
        other => Err(invalid(
            "backtest",
            "strategy",
            format!("unknown strategy '{other}' (expected gem or single_allocation)"),
        )),
    }
}

fn validate_strategy_kind(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    strategy_kind(config).map(|_| ())
}

/// Parses `[section] key` as an exact decimal. Missing keys yield `None`.
pub fn parse_decimal(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Decimal>, GemtraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|e| invalid(section, key, format!("not a decimal: {e}"))),
    }
}

pub fn initial_amount(config: &dyn ConfigPort) -> Result<Decimal, GemtraderError> {
    parse_decimal(config, "backtest", "initial_amount")?.ok_or_else(|| {
        GemtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "initial_amount".into(),
        }
    })
}

fn validate_initial_amount(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    if initial_amount(config)? <= Decimal::ZERO {
        return Err(invalid(
            "backtest",
            "initial_amount",
            "initial_amount must be positive".into(),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date".into(),
            ));
        }
    }
    Ok(())
}

/// Optional `[backtest]` date in `YYYY-MM-DD` form.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, GemtraderError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "backtest",
                    field,
                    format!("invalid {field} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

/// Lower-cased `[backtest] data_source`, defaulting to `sqlite`.
pub fn data_source(config: &dyn ConfigPort) -> Result<String, GemtraderError> {
    let source = config
        .get_string("backtest", "data_source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| SOURCE_SQLITE.to_string());
    match source.as_str() {
        SOURCE_SQLITE => {
            config.require_string("sqlite", "path")?;
            Ok(source)
        }
        SOURCE_CSV => {
            config.require_string("csv", "dir")?;
            Ok(source)
        }
        other => Err(invalid(
            "backtest",
            "data_source",
            format!("unknown data source '{other}' (expected sqlite or csv)"),
        )),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    data_source(config).map(|_| ())
}

/// `[backtest] reinvest_dividends`, defaulting to `true` when absent.
pub fn reinvest_dividends(config: &dyn ConfigPort) -> Result<bool, GemtraderError> {
    Ok(config
        .get_bool("backtest", "reinvest_dividends")?
        .unwrap_or(true))
}

/// `[gem] lookback_months`, defaulting to 12 when absent.
pub fn lookback_months(config: &dyn ConfigPort) -> Result<u32, GemtraderError> {
    let value = config
        .get_int(STRATEGY_GEM, "lookback_months")?
        .unwrap_or(12);
    u32::try_from(value)
        .ok()
        .filter(|m| *m >= 1)
        .ok_or_else(|| {
            invalid(
                STRATEGY_GEM,
                "lookback_months",
                "lookback_months must be at least 1".into(),
            )
        })
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), GemtraderError> {
    lookback_months(config).map(|_| ())
}

/// Builds and validates the `[gem]` universe.
pub fn rotation_universe(config: &dyn ConfigPort) -> Result<RotationUniverse, GemtraderError> {
    let risk_on = match config.get_string(STRATEGY_GEM, "risk_on") {
        Some(s) if !s.trim().is_empty() => {
            parse_instruments(&s).map_err(|e| invalid(STRATEGY_GEM, "risk_on", e.to_string()))?
        }
        _ => Vec::new(),
    };
    let risk_off_str = config.require_string(STRATEGY_GEM, "risk_off")?;
    let risk_off = parse_instruments(&risk_off_str)
        .map_err(|e| invalid(STRATEGY_GEM, "risk_off", e.to_string()))?;

    let risk_free_str = config.require_string(STRATEGY_GEM, "risk_free")?;
    let mut risk_free = parse_instruments(&risk_free_str)
        .map_err(|e| invalid(STRATEGY_GEM, "risk_free", e.to_string()))?;
    if risk_free.len() != 1 {
        return Err(invalid(
            STRATEGY_GEM,
            "risk_free",
            "exactly one risk-free instrument is required".into(),
        ));
    }

    let universe = RotationUniverse {
        risk_on,
        risk_off,
        risk_free: risk_free.remove(0),
    };
    universe
        .validate()
        .map_err(|e| invalid(STRATEGY_GEM, "risk_off", e.to_string()))?;
    Ok(universe)
}

fn invalid(section: &str, key: &str, reason: String) -> GemtraderError {
    GemtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
