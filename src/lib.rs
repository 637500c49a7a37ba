// src/lib.rs
//! Egress Classifier Library
//!
//! This library classifies the destination of every outbound packet, counts
//! packets per destination class and signals when a class would be shaped.
//! It never drops or delays anything: every packet is allowed.
//!
//! # Architecture
//!
//! The crate is structured into several key modules:
//!
//! - **classifier**: destination address → class label
//! - **counters**: lock-free per-label counters and snapshots
//! - **threshold**: per-label thresholds and shaping signals
//! - **engine**: per-packet classify → count → check → allow pipeline
//! - **signals**: non-blocking hand-off and logging of shaping signals
//! - **stats**: read-only text/JSON report and its HTTP endpoint
//! - **interception**: egress hook contract and trace replay feed
//! - **observability**: tracing and metrics setup
//! - **utils**: configuration and errors
//!
//! # Example
//!
//! ```
//! use egress_classifier::{ClassificationEngine, CounterRegistry, Disposition, Packet};
//! use egress_classifier::stats::StatsReporter;
//! use egress_classifier::threshold::{ShapingSignal, ThresholdMonitor};
//! use std::net::Ipv4Addr;
//! use std::sync::Arc;
//!
//! let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
//! let engine = ClassificationEngine::new(
//!     Arc::clone(&registry),
//!     ThresholdMonitor::default(),
//!     Arc::new(|signal: ShapingSignal| println!("shaping {}", signal.label)),
//! );
//!
//! let packet = Packet::new(1, Ipv4Addr::new(10, 0, 0, 1));
//! assert_eq!(engine.process(Some(&packet)), Disposition::Allow);
//!
//! let report = StatsReporter::new(registry).render();
//! assert!(report.starts_with("IPv4 Class A: 1\n"));
//! ```

// Public module exports
pub mod classifier;
pub mod counters;
pub mod engine;
pub mod interception;
pub mod observability;
pub mod signals;
pub mod stats;
pub mod threshold;
pub mod utils;

// Re-export commonly used types
pub use classifier::{classify, ClassLabel, Destination};
pub use counters::{CounterRegistry, CounterSnapshot};
pub use engine::{ClassificationEngine, Disposition, Packet, SignalSink};
pub use utils::config::EngineConfig;
pub use utils::errors::{EngineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Build information
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}
