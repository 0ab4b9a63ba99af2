//! CSV price files, one `<TICKER>.csv` per instrument.
//!
//! Expected header: `date,close,div_cash,split_factor`. The last two columns
//! may be omitted or left blank, meaning no dividend and no split.

use crate::domain::daily_record::{DailyRecord, DateRange, InstrumentId};
use crate::domain::error::GemtraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &InstrumentId) -> PathBuf {
        self.base_path.join(format!("{instrument}.csv"))
    }

    /// Reads every record of `path`, attributing them to `instrument`.
    pub fn read_file(
        path: &Path,
        instrument: &InstrumentId,
    ) -> Result<Vec<DailyRecord>, GemtraderError> {
        let content = fs::read_to_string(path).map_err(|e| GemtraderError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut records = Vec::new();

        for result in rdr.records() {
            let row = result.map_err(|e| GemtraderError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = row.get(0).ok_or_else(|| GemtraderError::Database {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                GemtraderError::Database {
                    reason: format!("invalid date '{date_str}': {e}"),
                }
            })?;

            let close = row
                .get(1)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| GemtraderError::Database {
                    reason: format!("missing close on {date}"),
                })
                .and_then(|s| parse_decimal("close", s))?;
            let dividend = optional_decimal(row.get(2), "div_cash", Decimal::ZERO)?;
            let split_factor = optional_decimal(row.get(3), "split_factor", Decimal::ONE)?;

            records.push(DailyRecord {
                instrument: instrument.clone(),
                date,
                close,
                dividend,
                split_factor,
            });
        }

        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, GemtraderError> {
    Decimal::from_str(value).map_err(|e| GemtraderError::Database {
        reason: format!("invalid {column} value '{value}': {e}"),
    })
}

fn optional_decimal(
    value: Option<&str>,
    column: &str,
    default: Decimal,
) -> Result<Decimal, GemtraderError> {
    match value {
        Some(s) if !s.is_empty() => parse_decimal(column, s),
        _ => Ok(default),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_daily_records(
        &self,
        instrument: &InstrumentId,
        range: DateRange,
    ) -> Result<Vec<DailyRecord>, GemtraderError> {
        let mut records = Self::read_file(&self.csv_path(instrument), instrument)?;
        records.retain(|r| range.contains(r.date));
        Ok(records)
    }

    fn list_instruments(&self) -> Result<Vec<InstrumentId>, GemtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| GemtraderError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GemtraderError::Database {
                reason: format!("directory entry error: {e}"),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    instruments.push(InstrumentId::new(&stem.to_string_lossy()));
                }
            }
        }

        instruments.sort();
        Ok(instruments)
    }

    fn get_data_range(
        &self,
        instrument: &InstrumentId,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GemtraderError> {
        let path = self.csv_path(instrument);
        if !path.exists() {
            return Ok(None);
        }
        let records = Self::read_file(&path, instrument)?;
        Ok(match (records.first(), records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, records.len())),
            _ => None,
        })
    }
}
