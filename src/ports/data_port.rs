//! Data access port trait.

use crate::domain::daily_record::{DailyRecord, DateRange, InstrumentId};
use crate::domain::error::GemtraderError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Records for one instrument inside `range`, in ascending date order.
    fn fetch_daily_records(
        &self,
        instrument: &InstrumentId,
        range: DateRange,
    ) -> Result<Vec<DailyRecord>, GemtraderError>;

    fn list_instruments(&self) -> Result<Vec<InstrumentId>, GemtraderError>;

    fn get_data_range(
        &self,
        instrument: &InstrumentId,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GemtraderError>;
}
