// src/counters/registry.rs
//! Counter registry shared by all classification calls

use crate::classifier::ClassLabel;
use crate::counters::counter::{LabelCounter, WrappingCounter};
use crate::counters::snapshot::CounterSnapshot;
use std::fmt;

/// One counter per classification label
///
/// Created zeroed at startup and only ever changed by [`increment`](Self::increment).
/// Wrap the registry in an `Arc` to share it between the engine and the
/// stats reader.
pub struct CounterRegistry<C: LabelCounter = WrappingCounter> {
    counters: [C; ClassLabel::COUNT],
}

impl<C: LabelCounter> CounterRegistry<C> {
    /// Create a registry with every counter at zero
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| C::starting_at(0)),
        }
    }

    /// Create a registry with selected counters starting at a given value
    ///
    /// Labels not listed start at zero. Used to probe counter boundaries.
    pub fn seeded(initial: &[(ClassLabel, u64)]) -> Self {
        let mut values = [0u64; ClassLabel::COUNT];
        for &(label, value) in initial {
            values[label.index()] = value;
        }

        Self {
            counters: std::array::from_fn(|i| C::starting_at(values[i])),
        }
    }

    /// Count one packet for `label` and return the new count
    #[inline]
    pub fn increment(&self, label: ClassLabel) -> u64 {
        self.counters[label.index()].increment()
    }

    /// Current count for `label`
    #[inline]
    pub fn get(&self, label: ClassLabel) -> u64 {
        self.counters[label.index()].load()
    }

    /// Copy every counter independently
    ///
    /// Each value is read atomically; the set as a whole is not a single
    /// transaction, so concurrent increments may land between two reads.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot::from_counts(std::array::from_fn(|i| self.counters[i].load()))
    }
}

impl<C: LabelCounter> Default for CounterRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: LabelCounter> fmt::Debug for CounterRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterRegistry")
            .field("counts", &self.snapshot())
            .finish()
    }
}
