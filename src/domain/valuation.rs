//! Daily mark-to-market valuation.

use crate::domain::error::GemtraderError;
use crate::domain::money::round_money;
use crate::domain::portfolio::{PortfolioState, ValuationPoint};
use crate::domain::series::UniverseRow;
use rust_decimal::Decimal;

/// `round2(shares × close + cash)` while holding, otherwise the cash balance.
pub fn portfolio_value(state: &PortfolioState, row: &UniverseRow) -> Result<Decimal, GemtraderError> {
    match &state.held {
        Some(held) => Ok(round_money(
            Decimal::from(state.shares) * row.close(held)? + state.cash,
        )),
        None => Ok(state.cash),
    }
}

pub fn value_point(state: &PortfolioState, row: &UniverseRow) -> Result<ValuationPoint, GemtraderError> {
    Ok(ValuationPoint {
        date: row.date,
        value: portfolio_value(state, row)?,
    })
}
