//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::GemtraderError;
use crate::domain::metrics::PerformanceSummary;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &PerformanceSummary,
        output_path: &str,
    ) -> Result<(), GemtraderError>;
}
