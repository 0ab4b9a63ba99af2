//! Investable universe of a rotation strategy.
//!
//! The momentum rule partitions its instruments into a risk-on set, a
//! risk-off set and a single risk-free instrument. Sets are parsed from
//! comma-separated configuration values and must not overlap.

use crate::domain::daily_record::InstrumentId;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationUniverse {
    pub risk_on: Vec<InstrumentId>,
    pub risk_off: Vec<InstrumentId>,
    pub risk_free: InstrumentId,
}

impl RotationUniverse {
    /// Every instrument the strategy needs prices for: risk-on, risk-off,
    /// then risk-free.
    pub fn members(&self) -> Vec<InstrumentId> {
        let mut members = Vec::with_capacity(self.risk_on.len() + self.risk_off.len() + 1);
        members.extend(self.risk_on.iter().cloned());
        members.extend(self.risk_off.iter().cloned());
        members.push(self.risk_free.clone());
        members
    }

    /// Instruments whose momentum is compared on each anchor date, in the
    /// order they are inserted into the momentum table.
    pub fn momentum_candidates(&self) -> Vec<InstrumentId> {
        let mut candidates = self.risk_off.clone();
        candidates.push(self.risk_free.clone());
        candidates
    }

    pub fn validate(&self) -> Result<(), UniverseError> {
        if self.risk_off.is_empty() {
            return Err(UniverseError::EmptyRiskOff);
        }
        let mut seen = HashSet::new();
        for id in self.members() {
            if !seen.insert(id.clone()) {
                return Err(UniverseError::Overlap(id.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),

    #[error("risk-off set must contain at least one instrument")]
    EmptyRiskOff,

    #[error("instrument {0} appears in more than one set")]
    Overlap(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<InstrumentId>, UniverseError> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let id = InstrumentId::new(trimmed);
        if !seen.insert(id.clone()) {
            return Err(UniverseError::DuplicateInstrument(id.to_string()));
        }
        ids.push(id);
    }

    Ok(ids)
}
