// src/engine/mod.rs
//! Classification engine
//!
//! Runs the per-packet pipeline:
//!
//! ```text
//! Packet → classify → CounterRegistry::increment → ThresholdMonitor::check
//!                                                        │
//!                                      signal? → SignalSink::emit (fire-and-forget)
//!                                                        │
//!                                               Disposition::Allow
//! ```
//!
//! The engine holds no per-call state. It never blocks, never fails and
//! always lets the packet through.

use crate::classifier::{classify, ClassLabel, Destination};
use crate::counters::{CounterRegistry, CounterSnapshot, LabelCounter, WrappingCounter};
use crate::threshold::{ShapingSignal, ThresholdMonitor};
use std::sync::Arc;
use tracing::trace;

/// An outbound packet as seen by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Identity assigned by the interception point
    pub id: u64,

    pub destination: Destination,
}

impl Packet {
    pub fn new(id: u64, destination: impl Into<Destination>) -> Self {
        Self {
            id,
            destination: destination.into(),
        }
    }
}

/// Verdict handed back to the interception point
///
/// Only `Allow` is produced today. The other variants are reserved for
/// enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Disposition {
    Allow,
    Shape,
    Drop,
}

/// Receiver for shaping signals
///
/// `emit` is called on the packet path and must return without blocking.
/// Delivery is best-effort.
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: ShapingSignal);
}

impl<F> SignalSink for F
where
    F: Fn(ShapingSignal) + Send + Sync,
{
    fn emit(&self, signal: ShapingSignal) {
        self(signal)
    }
}

/// Classify → count → check → allow
pub struct ClassificationEngine<C: LabelCounter = WrappingCounter> {
    registry: Arc<CounterRegistry<C>>,
    monitor: ThresholdMonitor,
    sink: Arc<dyn SignalSink>,
}

impl<C: LabelCounter> ClassificationEngine<C> {
    /// Create an engine over an existing registry
    pub fn new(
        registry: Arc<CounterRegistry<C>>,
        monitor: ThresholdMonitor,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            registry,
            monitor,
            sink,
        }
    }

    /// Process one outbound packet
    ///
    /// `None` stands for a hook invocation without packet data; it is
    /// accepted without being counted.
    pub fn process(&self, packet: Option<&Packet>) -> Disposition {
        let Some(packet) = packet else {
            trace!("No packet data, accepting");
            return Disposition::Allow;
        };

        let label = self.record(packet.destination);
        trace!(
            packet_id = packet.id,
            destination = %packet.destination,
            first_octet = ?packet.destination.first_octet(),
            %label,
            "Classified egress packet"
        );

        Disposition::Allow
    }

    /// Classify and count a destination, forwarding any shaping signal
    #[inline]
    pub fn record(&self, destination: Destination) -> ClassLabel {
        let label = classify(destination);
        let count = self.registry.increment(label);

        if let Some(signal) = self.monitor.check(label, count) {
            self.sink.emit(signal);
        }

        label
    }

    pub fn registry(&self) -> &Arc<CounterRegistry<C>> {
        &self.registry
    }

    pub fn monitor(&self) -> &ThresholdMonitor {
        &self.monitor
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.registry.snapshot()
    }
}
