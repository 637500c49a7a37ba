// src/counters/snapshot.rs
//! Immutable copies of the counter state

use crate::classifier::ClassLabel;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Point-in-time copy of every label's count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    counts: [u64; ClassLabel::COUNT],
}

impl CounterSnapshot {
    pub(crate) fn from_counts(counts: [u64; ClassLabel::COUNT]) -> Self {
        Self { counts }
    }

    /// Count for `label`
    pub fn get(&self, label: ClassLabel) -> u64 {
        self.counts[label.index()]
    }

    /// All labels with their counts, in label order
    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, u64)> + '_ {
        ClassLabel::ALL
            .into_iter()
            .map(move |label| (label, self.get(label)))
    }

    /// Sum over all labels, including the ones the report omits
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, &n| acc.wrapping_add(n))
    }
}

impl Serialize for CounterSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ClassLabel::COUNT))?;
        for (label, count) in self.iter() {
            map.serialize_entry(label.key(), &count)?;
        }
        map.end()
    }
}
