// src/stats/reporter.rs
//! Text and JSON rendering of the counter snapshot

use crate::classifier::ClassLabel;
use crate::counters::{CounterRegistry, CounterSnapshot, LabelCounter, WrappingCounter};
use std::fmt::Write;
use std::sync::Arc;

/// Renders counter snapshots for readers
pub struct StatsReporter<C: LabelCounter = WrappingCounter> {
    registry: Arc<CounterRegistry<C>>,
}

impl<C: LabelCounter> StatsReporter<C> {
    pub fn new(registry: Arc<CounterRegistry<C>>) -> Self {
        Self { registry }
    }

    /// Take a fresh snapshot
    pub fn snapshot(&self) -> CounterSnapshot {
        self.registry.snapshot()
    }

    /// Render the text report from a fresh snapshot
    pub fn render(&self) -> String {
        render_report(&self.snapshot())
    }

    /// Render every label, plus the total, as JSON
    pub fn render_json(&self) -> String {
        let snapshot = self.snapshot();
        serde_json::json!({
            "counters": snapshot,
            "total": snapshot.total(),
        })
        .to_string()
    }
}

/// Render the text report, one `name: count` line per reported label
///
/// The unknown IPv4 class is counted but not part of this report.
pub fn render_report(snapshot: &CounterSnapshot) -> String {
    let mut output = String::with_capacity(96);

    for label in ClassLabel::REPORTED {
        if let Some(name) = label.report_name() {
            // Writing to a String cannot fail
            let _ = writeln!(output, "{}: {}", name, snapshot.get(label));
        }
    }

    output
}
