//! Daily price and corporate-action records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

/// Upper-cased ticker symbol of a tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(ticker: &str) -> Self {
        InstrumentId(ticker.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(ticker: &str) -> Self {
        InstrumentId::new(ticker)
    }
}

/// Close price and corporate actions of one instrument on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRecord {
    pub close: Decimal,
    pub dividend: Decimal,
    pub split_factor: Decimal,
}

impl PriceRecord {
    /// A plain close with no dividend and no split.
    pub fn close_only(close: Decimal) -> Self {
        PriceRecord {
            close,
            dividend: Decimal::ZERO,
            split_factor: Decimal::ONE,
        }
    }

    pub fn has_split(&self) -> bool {
        self.split_factor != Decimal::ONE
    }

    pub fn has_dividend(&self) -> bool {
        self.dividend > Decimal::ZERO
    }

    /// Returns the first data-quality problem with this record, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.close <= Decimal::ZERO {
            return Err(format!("close price {} must be positive", self.close));
        }
        if self.dividend < Decimal::ZERO {
            return Err(format!("dividend {} must be non-negative", self.dividend));
        }
        if self.split_factor <= Decimal::ZERO {
            return Err(format!(
                "split factor {} must be positive",
                self.split_factor
            ));
        }
        Ok(())
    }
}

/// One stored row: an instrument's record for a date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub instrument: InstrumentId,
    pub date: NaiveDate,
    pub close: Decimal,
    pub dividend: Decimal,
    pub split_factor: Decimal,
}

impl DailyRecord {
    pub fn price(&self) -> PriceRecord {
        PriceRecord {
            close: self.close,
            dividend: self.dividend,
            split_factor: self.split_factor,
        }
    }
}

/// Inclusive calendar date range used when querying the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Covers every date a four-digit year can express.
    pub fn unbounded() -> Self {
        DateRange {
            start: NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
