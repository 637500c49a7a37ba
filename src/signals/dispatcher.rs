// src/signals/dispatcher.rs
//! Background dispatcher for shaping signals
//!
//! Drains the [`SignalQueue`] on a fixed interval, logs every signal as a
//! simulated shaping action, updates metrics and forwards a stamped
//! [`SignalRecord`] to any subscribers.

use crate::classifier::ClassLabel;
use crate::observability::{SHAPING_SIGNALS_DROPPED_TOTAL, SHAPING_SIGNALS_TOTAL};
use crate::signals::queue::SignalQueue;
use crate::threshold::ShapingSignal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Subscriber channel depth
const SUBSCRIBER_CAPACITY: usize = 1024;

/// A shaping signal after it left the packet path
#[derive(Debug, Clone, Serialize)]
pub struct SignalRecord {
    /// Unique record ID
    pub id: String,

    /// When the dispatcher picked the signal up
    pub dispatched_at: DateTime<Utc>,

    pub label: ClassLabel,

    pub count: u64,

    pub threshold: u64,
}

impl SignalRecord {
    fn stamp(signal: ShapingSignal) -> Self {
        Self {
            id: Ulid::new().to_string(),
            dispatched_at: Utc::now(),
            label: signal.label,
            count: signal.count,
            threshold: signal.threshold,
        }
    }
}

/// Dispatcher statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Signals logged so far
    pub dispatched: u64,

    /// Signals lost to a full queue
    pub dropped: u64,
}

/// Drains signals off the packet path
pub struct SignalDispatcher {
    queue: Arc<SignalQueue>,
    drain_interval: Duration,
    dispatched: Arc<AtomicU64>,
    records: broadcast::Sender<SignalRecord>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SignalDispatcher {
    /// Create a dispatcher for `queue`
    pub fn new(queue: Arc<SignalQueue>, drain_interval: Duration) -> Self {
        let (records, _) = broadcast::channel(SUBSCRIBER_CAPACITY);

        Self {
            queue,
            drain_interval,
            dispatched: Arc::new(AtomicU64::new(0)),
            records,
            shutdown: CancellationToken::new(),
            handle: None,
        }
    }

    /// Receive every dispatched record from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SignalRecord> {
        self.records.subscribe()
    }

    /// Start the background drain task
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        info!("Starting shaping signal dispatcher");

        let queue = Arc::clone(&self.queue);
        let dispatched = Arc::clone(&self.dispatched);
        let records = self.records.clone();
        let shutdown = self.shutdown.clone();
        let drain_interval = self.drain_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(drain_interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        Self::drain(&queue, &dispatched, &records);
                    }

                    _ = shutdown.cancelled() => {
                        // Final drain so nothing queued before shutdown is lost
                        Self::drain(&queue, &dispatched, &records);
                        break;
                    }
                }
            }

            debug!("Shaping signal dispatcher stopped");
        });

        self.handle = Some(handle);
    }

    fn drain(
        queue: &SignalQueue,
        dispatched: &AtomicU64,
        records: &broadcast::Sender<SignalRecord>,
    ) {
        let mut drained = 0u64;

        while let Some(signal) = queue.try_pop() {
            let record = SignalRecord::stamp(signal);

            info!(
                class = record.label.key(),
                count = record.count,
                threshold = record.threshold,
                "[SIMULATION] Traffic shaping triggered for {}",
                record.label
            );
            metrics::counter!(SHAPING_SIGNALS_TOTAL, "class" => record.label.key()).increment(1);

            // No subscribers is fine
            let _ = records.send(record);
            drained += 1;
        }

        if drained > 0 {
            dispatched.fetch_add(drained, Ordering::Relaxed);
            debug!("Dispatched {} shaping signals", drained);
        }

        metrics::counter!(SHAPING_SIGNALS_DROPPED_TOTAL).absolute(queue.stats().drop_count);
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.queue.stats().drop_count,
        }
    }

    /// Stop the drain task after a final drain
    pub async fn shutdown(&mut self) -> DispatchStats {
        info!("Shutting down shaping signal dispatcher");

        self.shutdown.cancel();

        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        } else {
            // Never started; still account for anything queued
            Self::drain(&self.queue, &self.dispatched, &self.records);
        }

        let queue_stats = self.queue.stats();
        if queue_stats.drop_count > 0 {
            warn!(
                "{} shaping signals dropped on a full queue ({:.2}% of offered)",
                queue_stats.drop_count,
                queue_stats.drop_rate()
            );
        }

        self.stats()
    }
}

impl Drop for SignalDispatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
