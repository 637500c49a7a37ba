// src/interception/hook.rs
//! Egress hook contract
//!
//! One entry point serves both address families. The caller resolves the
//! destination to host order before building the [`Packet`].

use crate::counters::LabelCounter;
use crate::engine::{ClassificationEngine, Disposition, Packet};
use std::fmt;

/// Where in the outbound path the hook sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HookPoint {
    /// Locally generated packets, before routing
    LocalOut,
}

/// Hook ordering relative to other handlers at the same point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HookPriority {
    /// Ahead of every other handler
    First,
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPoint::LocalOut => f.write_str("local-out"),
        }
    }
}

/// Handler invoked by the interception point for every outbound packet
///
/// Implementations must be callable concurrently from every packet path and
/// must never block. `None` means the hook fired without packet data.
pub trait EgressHook: Send + Sync {
    fn on_egress(&self, packet: Option<&Packet>) -> Disposition;

    /// Attachment point the handler expects
    fn hook_point(&self) -> HookPoint {
        HookPoint::LocalOut
    }

    fn priority(&self) -> HookPriority {
        HookPriority::First
    }
}

impl<C: LabelCounter> EgressHook for ClassificationEngine<C> {
    #[inline]
    fn on_egress(&self, packet: Option<&Packet>) -> Disposition {
        self.process(packet)
    }
}
