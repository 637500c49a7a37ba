// src/signals/queue.rs
//! Lock-free MPMC signal queue

use crate::engine::SignalSink;
use crate::threshold::ShapingSignal;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded queue between the packet path and the dispatcher
pub struct SignalQueue {
    queue: ArrayQueue<ShapingSignal>,

    /// Signals accepted
    push_count: AtomicU64,

    /// Signals taken by the dispatcher
    pop_count: AtomicU64,

    /// Signals dropped because the queue was full
    drop_count: AtomicU64,
}

impl SignalQueue {
    /// Create a queue holding at most `capacity` pending signals
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            push_count: AtomicU64::new(0),
            pop_count: AtomicU64::new(0),
            drop_count: AtomicU64::new(0),
        }
    }

    /// Push a signal (non-blocking, lock-free)
    pub fn push(&self, signal: ShapingSignal) -> Result<(), ShapingSignal> {
        match self.queue.push(signal) {
            Ok(()) => {
                self.push_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(signal) => {
                self.drop_count.fetch_add(1, Ordering::Relaxed);
                Err(signal)
            }
        }
    }

    /// Try to pop a signal (non-blocking)
    pub fn try_pop(&self) -> Option<ShapingSignal> {
        let signal = self.queue.pop()?;
        self.pop_count.fetch_add(1, Ordering::Relaxed);
        Some(signal)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            push_count: self.push_count.load(Ordering::Relaxed),
            pop_count: self.pop_count.load(Ordering::Relaxed),
            drop_count: self.drop_count.load(Ordering::Relaxed),
            current_size: self.queue.len(),
            capacity: self.queue.capacity(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl SignalSink for SignalQueue {
    #[inline]
    fn emit(&self, signal: ShapingSignal) {
        // Best-effort: a full queue drops the signal, counted in drop_count
        let _ = self.push(signal);
    }
}

/// Queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub push_count: u64,
    pub pop_count: u64,
    pub drop_count: u64,
    pub current_size: usize,
    pub capacity: usize,
}

impl QueueStats {
    /// Percentage of offered signals that were dropped
    pub fn drop_rate(&self) -> f64 {
        let offered = self.push_count + self.drop_count;
        if offered == 0 {
            0.0
        } else {
            (self.drop_count as f64 / offered as f64) * 100.0
        }
    }
}
