//! Portfolio state carried through the simulation.

use crate::domain::daily_record::InstrumentId;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Cash, share count and held instrument at the end of a simulated step.
///
/// Step functions take the state by value and return the updated one, so each
/// day's transition can be tested in isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioState {
    pub cash: Decimal,
    pub held: Option<InstrumentId>,
    pub shares: u64,
}

/// Allocation as seen by the rotation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationState {
    InInstrument(InstrumentId),
    InCash,
}

impl PortfolioState {
    pub fn new(initial_amount: Decimal) -> Self {
        PortfolioState {
            cash: initial_amount,
            held: None,
            shares: 0,
        }
    }

    pub fn rotation_state(&self) -> RotationState {
        match &self.held {
            Some(id) => RotationState::InInstrument(id.clone()),
            None => RotationState::InCash,
        }
    }

    /// Whether the current allocation is exactly `target`, where `None` is
    /// all cash.
    pub fn is_holding(&self, target: Option<&InstrumentId>) -> bool {
        self.held.as_ref() == target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// A completed rotation: liquidation of `from` (if any) and purchase of `to`
/// (if any) on `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchEvent {
    pub date: NaiveDate,
    pub from: Option<InstrumentId>,
    pub to: Option<InstrumentId>,
    pub shares: u64,
    pub price: Option<Decimal>,
}
