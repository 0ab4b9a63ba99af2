//! SQLite price store.
//!
//! Decimal columns are stored as TEXT so that closes, dividends and split
//! factors round-trip exactly.

use crate::domain::daily_record::{DailyRecord, DateRange, InstrumentId};
use crate::domain::error::GemtraderError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GemtraderError> {
        let db_path = config.require_string("sqlite", "path")?;
        let pool_size = config.get_int("sqlite", "pool_size")?.unwrap_or(4).clamp(1, 64) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        debug!(path = %db_path, pool_size, "opened sqlite store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, GemtraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, GemtraderError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), GemtraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS daily_price (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close_price TEXT NOT NULL,
                    div_cash TEXT NOT NULL DEFAULT '0',
                    split_factor TEXT NOT NULL DEFAULT '1',
                    PRIMARY KEY (ticker, date)
                );
                CREATE INDEX IF NOT EXISTS idx_daily_price_date ON daily_price(date);",
            )
            .map_err(query_error)
    }

    /// Upserts `records` in a single transaction.
    pub fn insert_records(&self, records: &[DailyRecord]) -> Result<usize, GemtraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for record in records {
            tx.execute(
                "INSERT OR REPLACE INTO daily_price (ticker, date, close_price, div_cash, split_factor)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.instrument.as_str(),
                    record.date.format(DATE_FORMAT).to_string(),
                    record.close.to_string(),
                    record.dividend.to_string(),
                    record.split_factor.to_string(),
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        debug!(rows = records.len(), "inserted daily records");
        Ok(records.len())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_daily_records(
        &self,
        instrument: &InstrumentId,
        range: DateRange,
    ) -> Result<Vec<DailyRecord>, GemtraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, close_price, div_cash, split_factor
                 FROM daily_price
                 WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    instrument.as_str(),
                    range.start.format(DATE_FORMAT).to_string(),
                    range.end.format(DATE_FORMAT).to_string(),
                ],
                |row| {
                    Ok(DailyRecord {
                        instrument: instrument.clone(),
                        date: text_date(&row.get::<_, String>(0)?)?,
                        close: text_decimal(&row.get::<_, String>(1)?)?,
                        dividend: text_decimal(&row.get::<_, String>(2)?)?,
                        split_factor: text_decimal(&row.get::<_, String>(3)?)?,
                    })
                },
            )
            .map_err(query_error)?;

        let records = rows.collect::<Result<Vec<_>, _>>().map_err(query_error)?;
        Ok(records)
    }

    fn list_instruments(&self) -> Result<Vec<InstrumentId>, GemtraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM daily_price ORDER BY ticker")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_error)?;

        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(InstrumentId::new(&row.map_err(query_error)?));
        }
        Ok(instruments)
    }

    fn get_data_range(
        &self,
        instrument: &InstrumentId,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GemtraderError> {
        let conn = self.conn()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM daily_price WHERE ticker = ?1",
                params![instrument.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                let min = text_date(&min).map_err(query_error)?;
                let max = text_date(&max).map_err(query_error)?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

fn text_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn text_decimal(s: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn pool_error(e: r2d2::Error) -> GemtraderError {
    GemtraderError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> GemtraderError {
    GemtraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}
