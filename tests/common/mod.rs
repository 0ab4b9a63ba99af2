#![allow(dead_code)]

use chrono::NaiveDate;
use gemtrader::domain::daily_record::{DailyRecord, DateRange, InstrumentId};
use gemtrader::domain::error::GemtraderError;
use gemtrader::domain::strategy::{Strategy, StrategyConfig};
use gemtrader::domain::universe::RotationUniverse;
use gemtrader::ports::data_port::DataPort;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

pub struct MockDataPort {
    pub data: HashMap<InstrumentId, Vec<DailyRecord>>,
    pub errors: HashMap<InstrumentId, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_records(mut self, code: &str, records: Vec<DailyRecord>) -> Self {
        self.data.insert(InstrumentId::new(code), records);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors
            .insert(InstrumentId::new(code), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily_records(
        &self,
        instrument: &InstrumentId,
        range: DateRange,
    ) -> Result<Vec<DailyRecord>, GemtraderError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(GemtraderError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(instrument)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| range.contains(r.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<InstrumentId>, GemtraderError> {
        let mut ids: Vec<_> = self.data.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn get_data_range(
        &self,
        instrument: &InstrumentId,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GemtraderError> {
        match self.data.get(instrument) {
            Some(records) if !records.is_empty() => {
                let min = records.iter().map(|r| r.date).min().unwrap();
                let max = records.iter().map(|r| r.date).max().unwrap();
                Ok(Some((min, max, records.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A record with no dividend and no split.
pub fn make_record(code: &str, date_str: &str, close: &str) -> DailyRecord {
    make_action_record(code, date_str, close, "0", "1")
}

pub fn make_action_record(
    code: &str,
    date_str: &str,
    close: &str,
    dividend: &str,
    split_factor: &str,
) -> DailyRecord {
    DailyRecord {
        instrument: InstrumentId::new(code),
        date: date(date_str),
        close: decimal(close),
        dividend: decimal(dividend),
        split_factor: decimal(split_factor),
    }
}

/// Records on consecutive calendar days starting at `start`.
pub fn make_daily_records(code: &str, start: &str, closes: &[&str]) -> Vec<DailyRecord> {
    let start = date(start);
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| DailyRecord {
            instrument: InstrumentId::new(code),
            date: start + chrono::Duration::days(i as i64),
            close: decimal(close),
            dividend: Decimal::ZERO,
            split_factor: Decimal::ONE,
        })
        .collect()
}

pub fn buy_and_hold(code: &str, initial: &str, reinvest: bool) -> StrategyConfig {
    StrategyConfig {
        name: code.to_string(),
        initial_amount: decimal(initial),
        reinvest_dividends: reinvest,
        strategy: Strategy::BuyAndHold {
            instrument: InstrumentId::new(code),
        },
    }
}

pub fn gem(
    risk_on: &[&str],
    risk_off: &[&str],
    risk_free: &str,
    lookback_months: u32,
    initial: &str,
) -> StrategyConfig {
    StrategyConfig {
        name: "GEM".to_string(),
        initial_amount: decimal(initial),
        reinvest_dividends: true,
        strategy: Strategy::Momentum {
            universe: RotationUniverse {
                risk_on: risk_on.iter().map(|c| InstrumentId::new(c)).collect(),
                risk_off: risk_off.iter().map(|c| InstrumentId::new(c)).collect(),
                risk_free: InstrumentId::new(risk_free),
            },
            lookback_months,
        },
    }
}
