//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for gemtrader.
#[derive(Debug, thiserror::Error)]
pub enum GemtraderError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("no data available for universe [{universe}]")]
    DataUnavailable { universe: String },

    #[error("insufficient data: series ends {last_date}, first decision needs {needed}")]
    InsufficientData {
        last_date: NaiveDate,
        needed: NaiveDate,
    },

    #[error("invalid record for {instrument} on {date}: {reason}")]
    InvalidRecord {
        instrument: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("instrument {instrument} has no record on {date}")]
    MissingInstrument { instrument: String, date: NaiveDate },

    #[error("no record within {days} days after {from} for lookback of {instrument}")]
    LookbackGap {
        instrument: String,
        from: NaiveDate,
        days: i64,
    },

    #[error("arithmetic error: {reason}")]
    Arithmetic { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GemtraderError> for std::process::ExitCode {
    fn from(err: &GemtraderError) -> Self {
        let code: u8 = match err {
            GemtraderError::Io(_) => 1,
            GemtraderError::ConfigParse { .. }
            | GemtraderError::ConfigMissing { .. }
            | GemtraderError::ConfigInvalid { .. } => 2,
            GemtraderError::Database { .. } | GemtraderError::DatabaseQuery { .. } => 3,
            GemtraderError::DataUnavailable { .. }
            | GemtraderError::InsufficientData { .. }
            | GemtraderError::InvalidRecord { .. }
            | GemtraderError::MissingInstrument { .. }
            | GemtraderError::LookbackGap { .. } => 5,
            GemtraderError::Arithmetic { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

/// A performance statistic that has no defined value for the given series.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UndefinedMetric {
    #[error("simulation period rounds to {years} years")]
    ZeroSimulationPeriod { years: String },

    #[error("need at least {needed} monthly returns, have {have}")]
    InsufficientMonthlySamples { have: usize, needed: usize },

    #[error("portfolio value is zero on {date}")]
    ZeroValuation { date: NaiveDate },

    #[error("initial amount must be positive")]
    NonPositiveInitialAmount,

    #[error("growth rate overflows decimal range")]
    Overflow,
}
