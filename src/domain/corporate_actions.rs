//! Split adjustment and dividend reinvestment for the held instrument.
//!
//! Within one date the split is applied first, so the dividend is paid on the
//! post-split share count.

use crate::domain::daily_record::PriceRecord;
use crate::domain::error::GemtraderError;
use crate::domain::money::{round_money, to_share_count, whole_shares};
use crate::domain::portfolio::PortfolioState;
use rust_decimal::Decimal;
use tracing::debug;

/// Applies the day's corporate actions of the held instrument.
///
/// `record` must be the held instrument's record for the date. A state with
/// nothing held is returned unchanged.
pub fn apply_corporate_actions(
    state: PortfolioState,
    record: &PriceRecord,
    reinvest_dividends: bool,
) -> Result<PortfolioState, GemtraderError> {
    if state.held.is_none() {
        return Ok(state);
    }
    let state = if record.has_split() {
        apply_split(state, record.split_factor)?
    } else {
        state
    };
    apply_dividend(state, record, reinvest_dividends)
}

/// `shares := floor(shares × factor)`; fractional shares are dropped.
pub fn apply_split(
    mut state: PortfolioState,
    split_factor: Decimal,
) -> Result<PortfolioState, GemtraderError> {
    let before = state.shares;
    state.shares = to_share_count((Decimal::from(before) * split_factor).floor())?;
    debug!(before, after = state.shares, %split_factor, "split applied");
    Ok(state)
}

pub fn apply_dividend(
    mut state: PortfolioState,
    record: &PriceRecord,
    reinvest_dividends: bool,
) -> Result<PortfolioState, GemtraderError> {
    if !record.has_dividend() {
        return Ok(state);
    }
    let paid = round_money(record.dividend * Decimal::from(state.shares));
    state.cash += paid;
    debug!(per_share = %record.dividend, total = %paid, "dividend received");

    if reinvest_dividends {
        let (new_shares, remainder) = whole_shares(state.cash, record.close)?;
        state.shares += new_shares;
        state.cash = round_money(remainder);
        debug!(
            new_shares,
            shares = state.shares,
            cash = %state.cash,
            "dividend reinvested"
        );
    }
    Ok(state)
}
