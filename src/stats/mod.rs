// src/stats/mod.rs
//! Read-only statistics interface
//!
//! - **Reporter**: renders the counter snapshot as the fixed four-line text
//!   report, or as JSON with every label
//! - **Server**: HTTP endpoint exposing the report and Prometheus metrics
//!
//! ```text
//! GET /stats        IPv4 Class A: <n>
//!                   IPv4 Class B: <n>
//!                   IPv4 Class C: <n>
//!                   IPv6 Packets: <n>
//! GET /stats.json   all labels, including the unknown IPv4 class
//! GET /metrics      Prometheus exposition format
//! ```
//!
//! Reading never changes a counter.

pub mod reporter;
pub mod server;

pub use reporter::{render_report, StatsReporter};
pub use server::StatsServer;
