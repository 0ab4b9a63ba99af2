//! Momentum rotation: target selection and switch execution.
//!
//! On each anchor date the state machine moves between `InCash` and
//! `InInstrument(id)`. A switch liquidates the current holding and buys the
//! target at the same close inside one call, so no half-switched state is
//! ever returned.

use crate::domain::daily_record::InstrumentId;
use crate::domain::error::GemtraderError;
use crate::domain::momentum::MomentumTable;
use crate::domain::money::{round_money, whole_shares};
use crate::domain::portfolio::{PortfolioState, SwitchEvent};
use crate::domain::series::UniverseRow;
use crate::domain::universe::RotationUniverse;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Picks the allocation for this anchor date. `None` means cash.
///
/// When the risk-free instrument's momentum beats every risk-off
/// instrument, the first risk-on instrument is chosen (cash if there is
/// none). Otherwise the momentum leader is chosen.
pub fn select_target(
    universe: &RotationUniverse,
    momentum: &MomentumTable,
) -> Result<Option<InstrumentId>, GemtraderError> {
    let risk_free = momentum
        .get(&universe.risk_free)
        .ok_or_else(|| missing_momentum(&universe.risk_free))?;
    let best_risk_off = momentum
        .max_of(&universe.risk_off)
        .ok_or_else(|| GemtraderError::Arithmetic {
            reason: "no risk-off momentum computed".into(),
        })?;

    if risk_free > best_risk_off {
        debug!(%risk_free, %best_risk_off, "risk-free momentum dominates");
        return Ok(universe.risk_on.first().cloned());
    }

    momentum
        .leader()
        .cloned()
        .map(Some)
        .ok_or_else(|| GemtraderError::Arithmetic {
            reason: "empty momentum table".into(),
        })
}

fn missing_momentum(instrument: &InstrumentId) -> GemtraderError {
    GemtraderError::Arithmetic {
        reason: format!("no momentum computed for {instrument}"),
    }
}

/// Moves the portfolio into `target` at `row`'s closes.
///
/// Returns the state unchanged and no event when `target` is already the
/// current allocation.
pub fn execute_rotation(
    state: PortfolioState,
    target: Option<&InstrumentId>,
    row: &UniverseRow,
) -> Result<(PortfolioState, Option<SwitchEvent>), GemtraderError> {
    if state.is_holding(target) {
        debug!(date = %row.date, "no change is required");
        return Ok((state, None));
    }

    let from = state.held.clone();
    let mut state = liquidate(state, row)?;

    let (shares, price) = match target {
        Some(instrument) => {
            state = invest(state, instrument, row)?;
            info!(date = %row.date, ?from, to = %instrument, shares = state.shares, "switching instrument");
            (state.shares, Some(row.close(instrument)?))
        }
        None => {
            info!(date = %row.date, ?from, cash = %state.cash, "switching to cash");
            (0, None)
        }
    };

    let event = SwitchEvent {
        date: row.date,
        from,
        to: target.cloned(),
        shares,
        price,
    };
    Ok((state, Some(event)))
}

/// `InInstrument → InCash`: sells every share at the day's close.
pub fn liquidate(
    mut state: PortfolioState,
    row: &UniverseRow,
) -> Result<PortfolioState, GemtraderError> {
    if let Some(held) = state.held.take() {
        state.cash += Decimal::from(state.shares) * row.close(&held)?;
        state.shares = 0;
    }
    Ok(state)
}

/// `InCash → InInstrument`: buys as many whole shares as the cash allows.
pub fn invest(
    mut state: PortfolioState,
    instrument: &InstrumentId,
    row: &UniverseRow,
) -> Result<PortfolioState, GemtraderError> {
    let (shares, remainder) = whole_shares(state.cash, row.close(instrument)?)?;
    state.cash = round_money(remainder);
    state.shares = shares;
    state.held = Some(instrument.clone());
    Ok(state)
}
