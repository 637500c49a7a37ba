// src/signals/mod.rs
//! Shaping signal delivery
//!
//! Signals are produced on the packet path and must not slow it down, so
//! they are handed off through a lock-free queue and logged from a
//! background task:
//!
//! ```text
//! ClassificationEngine → SignalQueue::emit() → Lock-Free Queue → SignalDispatcher
//!                         (non-blocking)                              ↓
//!                                                         log + metrics + subscribers
//! ```
//!
//! Delivery is best-effort. When the queue is full the signal is dropped and
//! counted; the packet is still allowed.

pub mod dispatcher;
pub mod queue;

pub use dispatcher::{DispatchStats, SignalDispatcher, SignalRecord};
pub use queue::{QueueStats, SignalQueue};
