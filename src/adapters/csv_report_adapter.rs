//! CSV report adapter implementing ReportPort.
//!
//! Writes the daily valuation series as `date,portfolio_value` rows.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::GemtraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::ports::report_port::ReportPort;
use tracing::info;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(e: csv::Error) -> GemtraderError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => GemtraderError::Io(io),
        other => GemtraderError::Io(std::io::Error::other(format!("{other:?}"))),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &PerformanceSummary,
        output_path: &str,
    ) -> Result<(), GemtraderError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(csv_error)?;
        writer
            .write_record(["date", "portfolio_value"])
            .map_err(csv_error)?;

        for point in &result.valuations {
            writer
                .write_record([
                    point.date.format("%Y-%m-%d").to_string(),
                    point.value.to_string(),
                ])
                .map_err(csv_error)?;
        }
        writer.flush()?;

        info!(
            path = output_path,
            rows = result.valuations.len(),
            ending_value = %summary.ending_value,
            "valuation report written"
        );
        Ok(())
    }
}
