//! Simulation loop.
//!
//! One forward pass over the universe series in ascending date order. Each
//! day: corporate actions of the held instrument, then (on anchor dates) the
//! momentum rotation, then the day's valuation. Later days depend on every
//! earlier day's state, so the pass is strictly sequential.

use crate::domain::corporate_actions::apply_corporate_actions;
use crate::domain::error::GemtraderError;
use crate::domain::momentum::compute_momentum;
use crate::domain::portfolio::{PortfolioState, RotationState, SwitchEvent, ValuationPoint};
use crate::domain::rotation::{execute_rotation, invest, select_target};
use crate::domain::series::{UniverseRow, UniverseSeries};
use crate::domain::strategy::{Strategy, StrategyConfig};
use crate::domain::valuation::value_point;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Next date on which a rotation decision is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MomentumAnchor {
    next: NaiveDate,
}

impl MomentumAnchor {
    pub fn new(first: NaiveDate) -> Self {
        MomentumAnchor { next: first }
    }

    pub fn next(&self) -> NaiveDate {
        self.next
    }

    /// True when `date` is on or after the anchor; the anchor then advances by
    /// exactly one calendar month, however far `date` overshot it.
    pub fn reached(&mut self, date: NaiveDate) -> bool {
        if date < self.next {
            return false;
        }
        self.next = self
            .next
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        debug!(next = %self.next, "momentum anchor advanced");
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_amount: Decimal,
    pub start_date: NaiveDate,
    pub first_effective_date: NaiveDate,
    pub end_date: NaiveDate,
    pub valuations: Vec<ValuationPoint>,
    pub switches: Vec<SwitchEvent>,
    pub final_state: PortfolioState,
}

impl BacktestResult {
    /// Value on the last simulated date.
    pub fn ending_value(&self) -> Decimal {
        self.valuations
            .last()
            .map(|p| p.value)
            .unwrap_or(self.initial_amount)
    }
}

/// Result of one simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOutcome {
    pub state: PortfolioState,
    pub valuation: ValuationPoint,
    pub switch: Option<SwitchEvent>,
}

/// Advances `state` through `row`.
///
/// `anchor` is `None` for buy-and-hold, which never rotates.
pub fn step_day(
    state: PortfolioState,
    series: &UniverseSeries,
    row: &UniverseRow,
    config: &StrategyConfig,
    anchor: Option<&mut MomentumAnchor>,
) -> Result<DayOutcome, GemtraderError> {
    let mut state = match state.rotation_state() {
        RotationState::InInstrument(held) => {
            let record = *row.record(&held)?;
            apply_corporate_actions(state, &record, config.reinvest_dividends)?
        }
        RotationState::InCash => state,
    };

    let mut switch = None;
    if let (
        Some(anchor),
        Strategy::Momentum {
            universe,
            lookback_months,
        },
    ) = (anchor, &config.strategy)
    {
        if anchor.reached(row.date) {
            let momentum = compute_momentum(
                series,
                row,
                &universe.momentum_candidates(),
                *lookback_months,
            )?;
            let target = select_target(universe, &momentum)?;
            let (next, event) = execute_rotation(state, target.as_ref(), row)?;
            state = next;
            switch = event;
        }
    }

    let valuation = value_point(&state, row)?;
    debug!(
        date = %row.date,
        shares = state.shares,
        cash = %state.cash,
        value = %valuation.value,
        "portfolio state"
    );

    Ok(DayOutcome {
        state,
        valuation,
        switch,
    })
}

/// Runs the strategy over the full series.
pub fn run_backtest(
    series: &UniverseSeries,
    config: &StrategyConfig,
) -> Result<BacktestResult, GemtraderError> {
    let (Some(first_row), Some(end_date)) = (series.rows().first(), series.last_date()) else {
        return Err(GemtraderError::DataUnavailable {
            universe: config
                .members()
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    };
    let start_date = first_row.date;

    for member in config.members() {
        if !series.contains(&member) {
            return Err(GemtraderError::MissingInstrument {
                instrument: member.to_string(),
                date: start_date,
            });
        }
    }

    let first_effective_date = config.first_effective_date(start_date);
    if first_effective_date > end_date {
        return Err(GemtraderError::InsufficientData {
            last_date: end_date,
            needed: first_effective_date,
        });
    }

    info!(strategy = config.strategy.kind(), name = %config.name, "starting backtest");
    info!(members = ?config.members(), "universe");
    info!(%start_date, %first_effective_date, %end_date, "simulation period");
    info!(initial_amount = %config.initial_amount, reinvest_dividends = config.reinvest_dividends, "portfolio");

    let mut state = PortfolioState::new(config.initial_amount);
    let mut switches = Vec::new();
    let mut anchor = None;

    match &config.strategy {
        Strategy::BuyAndHold { instrument } => {
            state = invest(state, instrument, first_row)?;
            info!(
                %instrument,
                shares = state.shares,
                cash = %state.cash,
                "initial allocation"
            );
            switches.push(SwitchEvent {
                date: start_date,
                from: None,
                to: Some(instrument.clone()),
                shares: state.shares,
                price: Some(first_row.close(instrument)?),
            });
        }
        Strategy::Momentum { .. } => {
            anchor = Some(MomentumAnchor::new(first_effective_date));
        }
    }

    let mut valuations = Vec::with_capacity(series.len());
    for row in series.rows() {
        let outcome = step_day(state, series, row, config, anchor.as_mut())?;
        state = outcome.state;
        valuations.push(outcome.valuation);
        switches.extend(outcome.switch);
    }

    let result = BacktestResult {
        initial_amount: config.initial_amount,
        start_date,
        first_effective_date,
        end_date,
        valuations,
        switches,
        final_state: state,
    };
    info!(ending_value = %result.ending_value(), switches = result.switches.len(), "backtest complete");
    Ok(result)
}
