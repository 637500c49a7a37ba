// src/main.rs
//! Egress Classifier
//!
//! Classifies outbound packets by destination class, counts them and logs a
//! simulated traffic-shaping action once a class passes its threshold.

use anyhow::Result;
use egress_classifier::interception::{EgressHook, ReplayOutcome, TraceReplay};
use egress_classifier::observability::{init_metrics, init_tracing};
use egress_classifier::signals::{SignalDispatcher, SignalQueue};
use egress_classifier::stats::{StatsReporter, StatsServer};
use egress_classifier::threshold::{ThresholdMonitor, ThresholdTable};
use egress_classifier::utils::config::EngineConfig;
use egress_classifier::{BuildInfo, ClassificationEngine, CounterRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first: it decides how logging is set up
    let config = EngineConfig::load()?;

    // Dropping the guard at exit flushes buffered log lines
    let _log_guard = init_tracing(&config.observability)?;
    let metrics = init_metrics()?;

    let build = BuildInfo::current();
    info!(
        "Starting egress classifier v{} ({})",
        build.version, build.git_hash
    );
    info!("Configuration loaded: {:?}", config);

    // Shared state lives for the whole process and is discarded at exit
    let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
    let queue = Arc::new(SignalQueue::new(config.signals.queue_capacity));
    let monitor = ThresholdMonitor::new(ThresholdTable::from_config(&config.thresholds)?);

    let engine = Arc::new(ClassificationEngine::new(
        Arc::clone(&registry),
        monitor,
        queue.clone(),
    ));
    info!(
        "Classifier attached at {} with {:?} priority",
        engine.hook_point(),
        engine.priority()
    );

    let mut dispatcher = SignalDispatcher::new(
        Arc::clone(&queue),
        Duration::from_millis(config.signals.drain_interval_ms),
    );
    dispatcher.start();

    let shutdown = CancellationToken::new();
    let reporter = Arc::new(StatsReporter::new(Arc::clone(&registry)));

    let server_handle = if config.stats.enabled {
        let server =
            StatsServer::bind(config.stats.listen_addr, Arc::clone(&reporter), Some(metrics))
                .await?;
        Some(tokio::spawn(server.run(shutdown.clone())))
    } else {
        None
    };

    // Ctrl-C during a replay must still reach the final drain below
    let interrupted = match config.replay.source.clone() {
        Some(source) => {
            let replay = TraceReplay::new(engine.clone(), config.replay.workers);
            match replay.run_path_until(source, tokio::signal::ctrl_c()).await {
                ReplayOutcome::Finished(Ok(summary)) => {
                    info!(
                        "Replayed {} packets ({} malformed)",
                        summary.packets, summary.malformed
                    );
                    false
                }
                ReplayOutcome::Finished(Err(e)) => {
                    error!("Trace replay failed: {}", e);
                    false
                }
                ReplayOutcome::Interrupted => true,
            }
        }
        None => false,
    };

    if !interrupted {
        tokio::signal::ctrl_c().await?;
    }
    info!("Received shutdown signal, cleaning up...");

    shutdown.cancel();
    if let Some(handle) = server_handle {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Stats server error: {}", e),
            Err(e) => error!("Stats server task failed: {}", e),
        }
    }

    let dispatch = dispatcher.shutdown().await;
    info!(
        "Dispatched {} shaping signals ({} dropped)",
        dispatch.dispatched, dispatch.dropped
    );

    for line in reporter.render().lines() {
        info!("Final {}", line);
    }

    Ok(())
}
