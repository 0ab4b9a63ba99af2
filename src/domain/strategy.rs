//! Strategy configuration.

use crate::domain::daily_record::InstrumentId;
use crate::domain::universe::RotationUniverse;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Buys one instrument on the first date and never trades again.
    BuyAndHold { instrument: InstrumentId },
    /// Monthly momentum rotation between risk-on, risk-off and cash-like
    /// instruments.
    Momentum {
        universe: RotationUniverse,
        lookback_months: u32,
    },
}

impl Strategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::BuyAndHold { .. } => "single_allocation",
            Strategy::Momentum { .. } => "gem",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    pub name: String,
    pub initial_amount: Decimal,
    pub reinvest_dividends: bool,
    pub strategy: Strategy,
}

impl StrategyConfig {
    /// Instruments the loader must join.
    pub fn members(&self) -> Vec<InstrumentId> {
        match &self.strategy {
            Strategy::BuyAndHold { instrument } => vec![instrument.clone()],
            Strategy::Momentum { universe, .. } => universe.members(),
        }
    }

    /// First date the strategy can act on. Momentum needs one full lookback
    /// window of history before its first decision.
    pub fn first_effective_date(&self, series_start: NaiveDate) -> NaiveDate {
        match &self.strategy {
            Strategy::BuyAndHold { .. } => series_start,
            Strategy::Momentum {
                lookback_months, ..
            } => series_start
                .checked_add_months(Months::new(*lookback_months))
                .unwrap_or(NaiveDate::MAX),
        }
    }
}
