//! Per-leg tracking flags.
//!
//! Tracking decides which open legs feed the live PnL aggregate. It is a
//! separate axis from `Position::is_open`: an untracked leg stays open and is
//! still realized at square-off.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::contract::ContractId;

/// Tracking state of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    /// Contributes to live PnL while open.
    Tracked,
    /// Excluded from live PnL.
    #[default]
    Untracked,
}

/// Mapping from contract to tracking state.
///
/// Only registered contracts (legs that were opened at some point) have an
/// entry; lookups for anything else return `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingRegistry {
    states: HashMap<ContractId, TrackingState>,
}

impl TrackingRegistry {
    /// Register a contract as untracked. Existing entries are left alone.
    pub fn register(&mut self, contract: ContractId) {
        self.states.entry(contract).or_default();
    }

    /// Check if a contract has ever been registered.
    #[must_use]
    pub fn contains(&self, contract: &ContractId) -> bool {
        self.states.contains_key(contract)
    }

    /// Get the state of a registered contract.
    #[must_use]
    pub fn state(&self, contract: &ContractId) -> Option<TrackingState> {
        self.states.get(contract).copied()
    }

    /// Check if a contract is tracked.
    #[must_use]
    pub fn is_tracked(&self, contract: &ContractId) -> bool {
        self.state(contract) == Some(TrackingState::Tracked)
    }

    /// Mark as tracked. Returns true if the state changed.
    pub fn track(&mut self, contract: ContractId) -> bool {
        self.set(contract, TrackingState::Tracked)
    }

    /// Mark as untracked. Returns true if the state changed.
    pub fn untrack(&mut self, contract: ContractId) -> bool {
        self.set(contract, TrackingState::Untracked)
    }

    /// Mark every registered contract untracked.
    pub fn untrack_all(&mut self) {
        for state in self.states.values_mut() {
            *state = TrackingState::Untracked;
        }
    }

    /// Iterate over tracked contracts.
    pub fn tracked(&self) -> impl Iterator<Item = &ContractId> {
        self.states
            .iter()
            .filter(|(_, state)| **state == TrackingState::Tracked)
            .map(|(contract, _)| contract)
    }

    fn set(&mut self, contract: ContractId, state: TrackingState) -> bool {
        self.states.insert(contract, state) != Some(state)
    }
}
