//! In-process replay protection.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

use tracing::debug;

use crate::traits::ReplayGuard;

#[derive(Debug, Default)]
struct ReplayState {
    seen: HashSet<String>,
    in_flight: HashSet<String>,
}

/// A `ReplayGuard` backed by two sets under one mutex.
///
/// Entries are never evicted.  Construct one per execution authority and
/// share it (e.g. in an `Arc`) between every executor that must not run the
/// same contract twice.
#[derive(Debug, Default)]
pub struct InMemoryReplayGuard {
    state: Mutex<ReplayState>,
}

impl InMemoryReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed contract ids.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayGuard for InMemoryReplayGuard {
    fn has_seen(&self, contract_id: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seen
            .contains(contract_id)
    }

    fn try_reserve(&self, contract_id: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.seen.contains(contract_id) || state.in_flight.contains(contract_id) {
            return false;
        }
        state.in_flight.insert(contract_id.to_string());
        true
    }

    fn commit(&self, contract_id: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight.remove(contract_id);
        state.seen.insert(contract_id.to_string());
        debug!(contract_id = %contract_id, "contract id marked seen");
    }

    fn release(&self, contract_id: &str) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .remove(contract_id);
    }
}

/// Holds a reservation and releases it on drop unless committed.
pub(crate) struct Reservation<'a> {
    guard: &'a dyn ReplayGuard,
    contract_id: &'a str,
    committed: bool,
}

impl<'a> Reservation<'a> {
    pub(crate) fn acquire(guard: &'a dyn ReplayGuard, contract_id: &'a str) -> Option<Self> {
        guard
            .try_reserve(contract_id)
            .then(|| Self { guard, contract_id, committed: false })
    }

    pub(crate) fn commit(mut self) {
        self.guard.commit(self.contract_id);
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.guard.release(self.contract_id);
        }
    }
}
