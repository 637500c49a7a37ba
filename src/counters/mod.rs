// src/counters/mod.rs
//! Per-label packet counters
//!
//! - **Registry**: one atomic counter per [`ClassLabel`](crate::classifier::ClassLabel),
//!   shared by every caller of the engine
//! - **Counter policies**: overflow behavior lives behind [`LabelCounter`]
//! - **Snapshot**: per-label copies taken without locking the registry
//!
//! # Concurrency
//!
//! Labels are independent, so there is no registry-wide lock. Each increment
//! is a single atomic read-modify-write; concurrent callers on the same label
//! observe strictly increasing counts and no update is lost.

pub mod counter;
pub mod registry;
pub mod snapshot;

pub use counter::{LabelCounter, SaturatingCounter, WrappingCounter};
pub use registry::CounterRegistry;
pub use snapshot::CounterSnapshot;
