// src/interception/mod.rs
//! Packet interception layer
//!
//! This module is the boundary to whatever feeds outbound packets in:
//!
//! - **Egress Hook**: the call the interception point makes for every
//!   outbound packet, answered with a [`Disposition`](crate::engine::Disposition)
//! - **Trace Replay**: feeds recorded destination addresses through the
//!   hook from a pool of worker threads
//!
//! # Architecture
//!
//! ```text
//! Outbound packet path (per CPU)
//!     │
//!     ├─ IPv4 packet ─┐
//!     │               ├─→ EgressHook::on_egress(Packet) → ClassificationEngine
//!     └─ IPv6 packet ─┘                                       │
//!                                                         Allow
//! ```

pub mod hook;
pub mod replay;

// Re-export commonly used types
pub use hook::{EgressHook, HookPoint, HookPriority};
pub use replay::{ReplayOutcome, ReplaySummary, TraceReplay};
