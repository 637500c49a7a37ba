// src/observability/mod.rs
//! Logging and metrics setup
//!
//! - **Tracing**: `tracing-subscriber` with an env filter, plain or JSON output,
//!   written to stdout through a non-blocking `tracing-appender` worker
//! - **Metrics**: Prometheus recorder; the handle renders the exposition text
//!   served by the stats endpoint
//!
//! Per-class packet counts are not recorded on the packet path. They are
//! published from a registry snapshot whenever metrics are scraped, see
//! [`publish_snapshot`].

use crate::counters::CounterSnapshot;
use crate::utils::config::ObservabilityConfig;
use crate::utils::errors::{EngineError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Packets classified, labelled by `class`
pub const PACKETS_TOTAL: &str = "egress_packets_total";

/// Shaping signals dispatched, labelled by `class`
pub const SHAPING_SIGNALS_TOTAL: &str = "egress_shaping_signals_total";

/// Shaping signals lost to a full queue
pub const SHAPING_SIGNALS_DROPPED_TOTAL: &str = "egress_shaping_signals_dropped_total";

/// Install the global tracing subscriber
///
/// Log lines are handed to a background writer thread, so the packet path
/// never waits on stdout. When that writer falls behind, lines are dropped.
/// The returned guard flushes pending lines when dropped and must be held
/// for the life of the process.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| EngineError::ObservabilityFailed(format!("Invalid log filter: {}", e)))?;

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init()
    };

    result.map_err(|e| {
        EngineError::ObservabilityFailed(format!("Failed to install subscriber: {}", e))
    })?;

    Ok(guard)
}

/// Install the Prometheus metrics recorder
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        EngineError::ObservabilityFailed(format!("Failed to install metrics recorder: {}", e))
    })?;

    metrics::describe_counter!(PACKETS_TOTAL, "Egress packets classified per destination class");
    metrics::describe_counter!(
        SHAPING_SIGNALS_TOTAL,
        "Simulated traffic shaping signals per destination class"
    );
    metrics::describe_counter!(
        SHAPING_SIGNALS_DROPPED_TOTAL,
        "Shaping signals dropped because the signal queue was full"
    );

    Ok(handle)
}

/// Publish per-class packet counts from a snapshot
pub fn publish_snapshot(snapshot: &CounterSnapshot) {
    for (label, count) in snapshot.iter() {
        metrics::counter!(PACKETS_TOTAL, "class" => label.key()).absolute(count);
    }
}
