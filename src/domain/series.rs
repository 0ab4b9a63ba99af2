//! Universe series loading and lookup.
//!
//! A [`UniverseSeries`] is the inner join of every member instrument's daily
//! records on date: a row exists only when all members have a close for that
//! date. Rows are strictly ascending and indexed by date.

use crate::domain::daily_record::{DateRange, InstrumentId, PriceRecord};
use crate::domain::error::GemtraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseRow {
    pub date: NaiveDate,
    pub records: HashMap<InstrumentId, PriceRecord>,
}

impl UniverseRow {
    pub fn record(&self, instrument: &InstrumentId) -> Result<&PriceRecord, GemtraderError> {
        self.records
            .get(instrument)
            .ok_or_else(|| GemtraderError::MissingInstrument {
                instrument: instrument.to_string(),
                date: self.date,
            })
    }

    pub fn close(&self, instrument: &InstrumentId) -> Result<rust_decimal::Decimal, GemtraderError> {
        self.record(instrument).map(|r| r.close)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSeries {
    members: Vec<InstrumentId>,
    rows: Vec<UniverseRow>,
    date_index: HashMap<NaiveDate, usize>,
}

impl UniverseSeries {
    /// Joins per-instrument record maps on date. Dates missing any member are
    /// dropped.
    pub fn from_records(
        members: Vec<InstrumentId>,
        per_instrument: &HashMap<InstrumentId, BTreeMap<NaiveDate, PriceRecord>>,
    ) -> Self {
        let mut rows = Vec::new();

        if let Some(first) = members.first().and_then(|m| per_instrument.get(m)) {
            for date in first.keys() {
                let records: HashMap<InstrumentId, PriceRecord> = members
                    .iter()
                    .filter_map(|m| {
                        per_instrument
                            .get(m)
                            .and_then(|by_date| by_date.get(date))
                            .map(|r| (m.clone(), *r))
                    })
                    .collect();
                if records.len() == members.len() {
                    rows.push(UniverseRow {
                        date: *date,
                        records,
                    });
                }
            }
        }

        let date_index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.date, i))
            .collect();

        UniverseSeries {
            members,
            rows,
            date_index,
        }
    }

    pub fn members(&self) -> &[InstrumentId] {
        &self.members
    }

    pub fn rows(&self) -> &[UniverseRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn get_row(&self, date: NaiveDate) -> Option<&UniverseRow> {
        self.date_index.get(&date).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, instrument: &InstrumentId) -> bool {
        self.members.contains(instrument)
    }
}

/// Fetches every member's records through `port` and joins them.
///
/// Fails with `DataUnavailable` when no date is covered by all members.
pub fn load_universe_series(
    port: &dyn DataPort,
    members: &[InstrumentId],
    range: DateRange,
) -> Result<UniverseSeries, GemtraderError> {
    let mut per_instrument: HashMap<InstrumentId, BTreeMap<NaiveDate, PriceRecord>> =
        HashMap::with_capacity(members.len());

    for instrument in members {
        let records = port.fetch_daily_records(instrument, range)?;
        debug!(%instrument, records = records.len(), "fetched daily records");

        let mut by_date = BTreeMap::new();
        for record in records {
            let price = record.price();
            if let Err(reason) = price.validate() {
                return Err(GemtraderError::InvalidRecord {
                    instrument: instrument.to_string(),
                    date: record.date,
                    reason,
                });
            }
            if by_date.insert(record.date, price).is_some() {
                return Err(GemtraderError::InvalidRecord {
                    instrument: instrument.to_string(),
                    date: record.date,
                    reason: "duplicate date".into(),
                });
            }
        }
        per_instrument.insert(instrument.clone(), by_date);
    }

    let series = UniverseSeries::from_records(members.to_vec(), &per_instrument);
    if series.is_empty() {
        return Err(GemtraderError::DataUnavailable {
            universe: members
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    debug!(
        rows = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "universe series joined"
    );
    Ok(series)
}
