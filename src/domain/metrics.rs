//! Performance metrics and statistics.
//!
//! Growth figures (CAGR, total return) and the drawdown ratio stay in
//! `Decimal`. Only volatility is computed in `f64`; the precision loss is
//! accepted there and nowhere in cash or share bookkeeping.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::UndefinedMetric;
use crate::domain::portfolio::ValuationPoint;
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use tracing::info;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Sample standard deviation needs at least this many monthly returns.
pub const MIN_MONTHLY_RETURNS: usize = 2;

fn days_per_year() -> Decimal {
    Decimal::new(3_652_425, 4)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub initial_amount: Decimal,
    pub ending_value: Decimal,
    pub simulation_years: Decimal,
    pub total_return: Result<Decimal, UndefinedMetric>,
    pub cagr: Result<Decimal, UndefinedMetric>,
    pub annualized_std_dev: Result<f64, UndefinedMetric>,
    pub max_drawdown: Result<f64, UndefinedMetric>,
    pub max_drawdown_duration: i64,
}

impl PerformanceSummary {
    pub fn compute(result: &BacktestResult) -> Self {
        let initial_amount = result.initial_amount;
        let ending_value = result.ending_value();
        let simulation_years = simulation_years(result.first_effective_date, result.end_date);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.valuations);

        let summary = PerformanceSummary {
            initial_amount,
            ending_value,
            simulation_years,
            total_return: total_return(initial_amount, ending_value),
            cagr: cagr(initial_amount, ending_value, simulation_years),
            annualized_std_dev: annualized_std_dev(&result.valuations),
            max_drawdown,
            max_drawdown_duration,
        };

        info!(years = %summary.simulation_years, "simulation time");
        info!(ending_value = %summary.ending_value, "ending portfolio value");
        match &summary.cagr {
            Ok(c) => info!("CAGR {} %", c.round_dp(2)),
            Err(e) => info!(reason = %e, "CAGR undefined"),
        }
        match &summary.annualized_std_dev {
            Ok(s) => info!("standard deviation {s:.2} %"),
            Err(e) => info!(reason = %e, "standard deviation undefined"),
        }
        summary
    }
}

/// Elapsed time in years, rounded to two places.
pub fn simulation_years(first_effective_date: NaiveDate, last_date: NaiveDate) -> Decimal {
    let days = Decimal::from((last_date - first_effective_date).num_days());
    (days / days_per_year()).round_dp(2)
}

/// Percentage gain over the initial amount.
pub fn total_return(initial: Decimal, ending: Decimal) -> Result<Decimal, UndefinedMetric> {
    if initial <= Decimal::ZERO {
        return Err(UndefinedMetric::NonPositiveInitialAmount);
    }
    Ok((ending - initial) / initial * Decimal::ONE_HUNDRED)
}

/// `((ending / initial) ^ (1 / years) − 1) × 100`.
pub fn cagr(initial: Decimal, ending: Decimal, years: Decimal) -> Result<Decimal, UndefinedMetric> {
    if years <= Decimal::ZERO {
        return Err(UndefinedMetric::ZeroSimulationPeriod {
            years: years.to_string(),
        });
    }
    if initial <= Decimal::ZERO {
        return Err(UndefinedMetric::NonPositiveInitialAmount);
    }
    if ending <= Decimal::ZERO {
        return Ok(-Decimal::ONE_HUNDRED);
    }

    let growth = (ending / initial)
        .checked_powd(Decimal::ONE / years)
        .ok_or(UndefinedMetric::Overflow)?;
    Ok((growth - Decimal::ONE) * Decimal::ONE_HUNDRED)
}

/// Last valuation of each calendar month, in series order.
pub fn month_end_values(valuations: &[ValuationPoint]) -> Vec<ValuationPoint> {
    let mut month_ends: Vec<ValuationPoint> = Vec::new();
    for point in valuations {
        match month_ends.last_mut() {
            Some(last)
                if last.date.year() == point.date.year()
                    && last.date.month() == point.date.month() =>
            {
                *last = point.clone();
            }
            _ => month_ends.push(point.clone()),
        }
    }
    month_ends
}

/// Month-over-month fractional change of the month-end values.
pub fn monthly_returns(valuations: &[ValuationPoint]) -> Result<Vec<f64>, UndefinedMetric> {
    month_end_values(valuations)
        .windows(2)
        .map(|w| {
            let (prev, curr) = (&w[0], &w[1]);
            if prev.value.is_zero() {
                return Err(UndefinedMetric::ZeroValuation { date: prev.date });
            }
            let change = (curr.value - prev.value) / prev.value;
            f64::try_from(change).map_err(|_| UndefinedMetric::Overflow)
        })
        .collect()
}

/// Sample standard deviation of monthly returns, annualized by √12, in
/// percent.
pub fn annualized_std_dev(valuations: &[ValuationPoint]) -> Result<f64, UndefinedMetric> {
    let returns = monthly_returns(valuations)?;
    if returns.len() < MIN_MONTHLY_RETURNS {
        return Err(UndefinedMetric::InsufficientMonthlySamples {
            have: returns.len(),
            needed: MIN_MONTHLY_RETURNS,
        });
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Ok(variance.sqrt() * MONTHS_PER_YEAR.sqrt() * 100.0)
}

/// Largest peak-to-trough decline as a fraction of the peak, and the longest
/// run of days spent below a previous peak.
///
/// The ratio is tracked in `Decimal` and converted to `f64` once at the end.
pub fn compute_drawdown(valuations: &[ValuationPoint]) -> (Result<f64, UndefinedMetric>, i64) {
    let Some(first) = valuations.first() else {
        return (Ok(0.0), 0);
    };

    let mut peak = first.value;
    let mut max_dd = Decimal::ZERO;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in valuations {
        let value = point.value;
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > Decimal::ZERO {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (
        f64::try_from(max_dd).map_err(|_| UndefinedMetric::Overflow),
        max_dd_duration,
    )
}
