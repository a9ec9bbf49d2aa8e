use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Counters shared by the schedules of a search, see [`crate::solution::schedule::RouteSchedule::with_statistics`].
#[derive(Default, Debug)]
pub struct PropagationStatistics {
    full_propagations: AtomicUsize,
    suffix_propagations: AtomicUsize,
    suffix_fallbacks: AtomicUsize,
    infeasible_propagations: AtomicUsize,
    change_checks: AtomicUsize,
    oracle_calls: AtomicUsize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropagationStatisticsSnapshot {
    pub full_propagations: usize,
    pub suffix_propagations: usize,
    pub suffix_fallbacks: usize,
    pub infeasible_propagations: usize,
    pub change_checks: usize,
    pub oracle_calls: usize,
}

impl PropagationStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_full_propagation(&self) {
        self.full_propagations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suffix_propagation(&self) {
        self.suffix_propagations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suffix_fallback(&self) {
        self.suffix_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_infeasible(&self) {
        self.infeasible_propagations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_change_check(&self) {
        self.change_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oracle_call(&self) {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PropagationStatisticsSnapshot {
        PropagationStatisticsSnapshot {
            full_propagations: self.full_propagations.load(Ordering::Relaxed),
            suffix_propagations: self.suffix_propagations.load(Ordering::Relaxed),
            suffix_fallbacks: self.suffix_fallbacks.load(Ordering::Relaxed),
            infeasible_propagations: self.infeasible_propagations.load(Ordering::Relaxed),
            change_checks: self.change_checks.load(Ordering::Relaxed),
            oracle_calls: self.oracle_calls.load(Ordering::Relaxed),
        }
    }
}
