//! Trailing-return momentum of rotation candidates.

use crate::domain::daily_record::InstrumentId;
use crate::domain::error::GemtraderError;
use crate::domain::series::{UniverseRow, UniverseSeries};
use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

/// Maximum number of calendar days scanned forward for a lookback record.
pub const LOOKBACK_SCAN_DAYS: i64 = 30;

/// Momentum per candidate, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MomentumTable {
    entries: Vec<(InstrumentId, Decimal)>,
}

impl MomentumTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a candidate. An overwrite moves the candidate to
    /// the end of the insertion order.
    pub fn insert(&mut self, instrument: InstrumentId, momentum: Decimal) {
        self.entries.retain(|(id, _)| *id != instrument);
        self.entries.push((instrument, momentum));
    }

    pub fn get(&self, instrument: &InstrumentId) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(id, _)| id == instrument)
            .map(|(_, m)| *m)
    }

    pub fn entries(&self) -> &[(InstrumentId, Decimal)] {
        &self.entries
    }

    /// Highest momentum among `instruments`, ignoring ones not in the table.
    pub fn max_of(&self, instruments: &[InstrumentId]) -> Option<Decimal> {
        instruments.iter().filter_map(|id| self.get(id)).max()
    }

    /// Instrument with the highest momentum.
    ///
    /// Equal momentum values are resolved last-write-wins: the candidate
    /// inserted later takes the value's slot when the table is inverted.
    pub fn leader(&self) -> Option<&InstrumentId> {
        let best = self.entries.iter().map(|(_, m)| *m).max()?;
        self.entries
            .iter()
            .rev()
            .find(|(_, m)| *m == best)
            .map(|(id, _)| id)
    }
}

/// `current_close / past_close − 1`.
pub fn trailing_return(current_close: Decimal, past_close: Decimal) -> Result<Decimal, GemtraderError> {
    current_close
        .checked_div(past_close)
        .map(|ratio| ratio - Decimal::ONE)
        .ok_or_else(|| GemtraderError::Arithmetic {
            reason: format!("cannot divide {current_close} by past close {past_close}"),
        })
}

/// Finds the row at the first series date on or after `current_date` minus
/// `lookback_months`, scanning forward one day at a time. Never scans
/// backward.
pub fn lookback_row<'a>(
    series: &'a UniverseSeries,
    current_date: NaiveDate,
    lookback_months: u32,
) -> Result<&'a UniverseRow, GemtraderError> {
    let start = current_date
        .checked_sub_months(Months::new(lookback_months))
        .ok_or_else(|| GemtraderError::Arithmetic {
            reason: format!("{current_date} minus {lookback_months} months out of range"),
        })?;
    debug!(%current_date, check_date = %start, "looking up momentum base");

    for offset in 0..=LOOKBACK_SCAN_DAYS as u64 {
        let Some(check_date) = start.checked_add_days(Days::new(offset)) else {
            break;
        };
        if let Some(row) = series.get_row(check_date) {
            return Ok(row);
        }
    }

    Err(GemtraderError::LookbackGap {
        instrument: series
            .members()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        from: start,
        days: LOOKBACK_SCAN_DAYS,
    })
}

/// Computes momentum for each candidate on `current`.
pub fn compute_momentum(
    series: &UniverseSeries,
    current: &UniverseRow,
    candidates: &[InstrumentId],
    lookback_months: u32,
) -> Result<MomentumTable, GemtraderError> {
    let past = lookback_row(series, current.date, lookback_months)?;

    let mut table = MomentumTable::new();
    for instrument in candidates {
        let momentum = trailing_return(current.close(instrument)?, past.close(instrument)?)?;
        table.insert(instrument.clone(), momentum);
    }
    debug!(date = %current.date, past = %past.date, table = ?table.entries(), "momentum computed");
    Ok(table)
}
