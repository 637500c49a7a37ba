// src/counters/counter.rs
//! Counter cells and their overflow policies

use std::sync::atomic::{AtomicU64, Ordering};

/// A single monotonically increasing counter
///
/// Implementations must be lock-free: `increment` runs on the packet path.
pub trait LabelCounter: Send + Sync {
    /// Create a counter starting at `initial`
    fn starting_at(initial: u64) -> Self
    where
        Self: Sized;

    /// Add one and return the new value
    fn increment(&self) -> u64;

    /// Current value
    fn load(&self) -> u64;
}

/// Counter that wraps to zero past `u64::MAX`
#[derive(Debug, Default)]
pub struct WrappingCounter(AtomicU64);

impl LabelCounter for WrappingCounter {
    fn starting_at(initial: u64) -> Self {
        Self(AtomicU64::new(initial))
    }

    #[inline]
    fn increment(&self) -> u64 {
        // fetch_add wraps on overflow
        self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline]
    fn load(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counter that sticks at `u64::MAX`
#[derive(Debug, Default)]
pub struct SaturatingCounter(AtomicU64);

impl LabelCounter for SaturatingCounter {
    fn starting_at(initial: u64) -> Self {
        Self(AtomicU64::new(initial))
    }

    #[inline]
    fn increment(&self) -> u64 {
        match self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1))
        {
            Ok(previous) => previous + 1,
            Err(max) => max,
        }
    }

    #[inline]
    fn load(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_increment() {
        let counter = WrappingCounter::default();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.load(), 2);
    }

    #[test]
    fn test_wrapping_overflow() {
        let counter = WrappingCounter::starting_at(u64::MAX - 1);
        assert_eq!(counter.increment(), u64::MAX);
        assert_eq!(counter.increment(), 0);
        assert_eq!(counter.increment(), 1);
    }

    #[test]
    fn test_saturating_overflow() {
        let counter = SaturatingCounter::starting_at(u64::MAX - 1);
        assert_eq!(counter.increment(), u64::MAX);
        assert_eq!(counter.increment(), u64::MAX);
        assert_eq!(counter.load(), u64::MAX);
    }
}
