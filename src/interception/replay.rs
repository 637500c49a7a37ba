// src/interception/replay.rs
//! Trace replay packet feed
//!
//! Reads one destination address per line and drives an [`EgressHook`] from
//! a pool of worker threads, the way several CPUs would invoke it for
//! concurrent outbound traffic.
//!
//! ```text
//! # comments and blank lines are skipped
//! 10.0.0.1
//! 2001:db8::1
//! 203.0.113.7
//! ```
//!
//! A line that does not parse as an address is delivered as a hook call
//! without packet data.
//!
//! The `*_until` variants run the replay on a detached thread and return as
//! soon as an interrupt future resolves. The reader stops at the next line;
//! a reader blocked on a pipe is left behind and cannot delay shutdown.

use crate::classifier::Destination;
use crate::engine::Packet;
use crate::interception::hook::EgressHook;
use crate::utils::errors::{EngineError, Result};
use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pending packets between the reader and the workers
const CHANNEL_CAPACITY: usize = 4096;

/// Outcome of a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Packets delivered with a destination
    pub packets: u64,

    /// Lines delivered as absent packets
    pub malformed: u64,

    pub elapsed: Duration,
}

impl ReplaySummary {
    /// Hook invocations made
    pub fn total(&self) -> u64 {
        self.packets + self.malformed
    }
}

enum TraceLine {
    Skip,
    Destination(Destination),
    Malformed,
}

fn parse_line(line: &str) -> TraceLine {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return TraceLine::Skip;
    }

    match trimmed.parse::<Destination>() {
        Ok(destination) => TraceLine::Destination(destination),
        Err(_) => TraceLine::Malformed,
    }
}

/// How an interruptible replay ended
#[derive(Debug)]
pub enum ReplayOutcome {
    /// The trace was read to the end, or failed
    Finished(Result<ReplaySummary>),

    /// The interrupt resolved first
    Interrupted,
}

/// Replays address traces through a hook
pub struct TraceReplay {
    hook: Arc<dyn EgressHook>,
    workers: usize,
    stop: CancellationToken,
}

impl TraceReplay {
    /// Create a replay driving `hook` from `workers` threads
    pub fn new(hook: Arc<dyn EgressHook>, workers: usize) -> Self {
        Self {
            hook,
            workers: workers.max(1),
            stop: CancellationToken::new(),
        }
    }

    /// Replay a trace file until `interrupt` resolves
    pub async fn run_path_until<F>(self, path: PathBuf, interrupt: F) -> ReplayOutcome
    where
        F: Future,
    {
        self.run_detached(move |replay| replay.run_path(&path), interrupt)
            .await
    }

    /// Replay `reader` until `interrupt` resolves
    pub async fn run_until<R, F>(self, reader: R, interrupt: F) -> ReplayOutcome
    where
        R: BufRead + Send + 'static,
        F: Future,
    {
        self.run_detached(move |replay| replay.run(reader), interrupt)
            .await
    }

    async fn run_detached<J, F>(self, job: J, interrupt: F) -> ReplayOutcome
    where
        J: FnOnce(&TraceReplay) -> Result<ReplaySummary> + Send + 'static,
        F: Future,
    {
        let stop = self.stop.clone();
        let (done_tx, done_rx) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("trace-replay".to_string())
            .spawn(move || {
                let _ = done_tx.send(job(&self));
            });
        if let Err(e) = spawned {
            return ReplayOutcome::Finished(Err(EngineError::ReplayFailed(format!(
                "Cannot start replay thread: {}",
                e
            ))));
        }

        tokio::select! {
            biased;

            _ = interrupt => {
                stop.cancel();
                info!("Trace replay interrupted");
                ReplayOutcome::Interrupted
            }
            done = done_rx => match done {
                Ok(result) => ReplayOutcome::Finished(result),
                Err(_) => ReplayOutcome::Finished(Err(EngineError::ReplayFailed(
                    "Replay thread exited without a result".to_string(),
                ))),
            },
        }
    }

    /// Replay a trace file, or stdin when `path` is `-`
    pub fn run_path(&self, path: &Path) -> Result<ReplaySummary> {
        if path == Path::new("-") {
            info!("Replaying trace from stdin");
            let stdin = std::io::stdin();
            return self.run(stdin.lock());
        }

        info!("Replaying trace from {:?}", path);
        let file = File::open(path).map_err(|e| {
            EngineError::ReplayFailed(format!("Cannot open trace {:?}: {}", path, e))
        })?;
        self.run(BufReader::new(file))
    }

    /// Replay every line of `reader`
    pub fn run<R: BufRead>(&self, reader: R) -> Result<ReplaySummary> {
        let start = Instant::now();
        let (tx, rx) = crossbeam_channel::bounded::<Option<Packet>>(CHANNEL_CAPACITY);

        let mut summary = std::thread::scope(|scope| -> Result<ReplaySummary> {
            for worker in 0..self.workers {
                let rx = rx.clone();
                let hook = Arc::clone(&self.hook);

                scope.spawn(move || {
                    let mut handled = 0u64;
                    for packet in rx.iter() {
                        hook.on_egress(packet.as_ref());
                        handled += 1;
                    }
                    debug!("Replay worker {} handled {} packets", worker, handled);
                });
            }
            drop(rx);

            let mut summary = ReplaySummary::default();
            let mut next_id = 0u64;

            for (index, line) in reader.lines().enumerate() {
                if self.stop.is_cancelled() {
                    debug!("Replay stopped before line {}", index + 1);
                    break;
                }
                let line = line?;

                let packet = match parse_line(&line) {
                    TraceLine::Skip => continue,
                    TraceLine::Destination(destination) => {
                        next_id += 1;
                        summary.packets += 1;
                        Some(Packet {
                            id: next_id,
                            destination,
                        })
                    }
                    TraceLine::Malformed => {
                        warn!(
                            "Line {}: unparseable destination {:?}, delivering as absent packet",
                            index + 1,
                            line.trim()
                        );
                        summary.malformed += 1;
                        None
                    }
                };

                tx.send(packet).map_err(|_| {
                    EngineError::ReplayFailed("Replay workers exited early".to_string())
                })?;
            }

            // Closing the channel lets the workers finish
            drop(tx);
            Ok(summary)
        })?;

        summary.elapsed = start.elapsed();
        info!(
            "Replay finished: {} packets, {} malformed lines in {:?}",
            summary.packets, summary.malformed, summary.elapsed
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassLabel;
    use crate::counters::CounterRegistry;
    use crate::engine::ClassificationEngine;
    use crate::threshold::{ShapingSignal, ThresholdMonitor};
    use std::io::{Cursor, Read, Write};
    use std::sync::mpsc;

    /// Reader that blocks until its sender is dropped, then reports EOF
    struct Stalled(mpsc::Receiver<()>);

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    fn engine(registry: &Arc<CounterRegistry>) -> Arc<ClassificationEngine> {
        Arc::new(ClassificationEngine::new(
            Arc::clone(registry),
            ThresholdMonitor::default(),
            Arc::new(|_: ShapingSignal| {}),
        ))
    }

    #[test]
    fn test_parse_line() {
        assert!(matches!(parse_line(""), TraceLine::Skip));
        assert!(matches!(parse_line("  # comment"), TraceLine::Skip));
        assert!(matches!(parse_line(" 10.0.0.1 "), TraceLine::Destination(_)));
        assert!(matches!(parse_line("fe80::1"), TraceLine::Destination(_)));
        assert!(matches!(parse_line("300.1.1.1"), TraceLine::Malformed));
    }

    #[test]
    fn test_replay_counts() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 4);

        let trace = "# sample\n10.0.0.1\n200.1.1.1\n\n150.2.2.2\n95.3.3.3\n::1\ngarbage\n";
        let summary = replay.run(Cursor::new(trace)).unwrap();

        assert_eq!(summary.packets, 5);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.total(), 6);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.get(ClassLabel::ClassA), 2);
        assert_eq!(snapshot.get(ClassLabel::ClassB), 1);
        assert_eq!(snapshot.get(ClassLabel::ClassC), 1);
        assert_eq!(snapshot.get(ClassLabel::V6), 1);
        // The malformed line was never classified
        assert_eq!(snapshot.total(), 5);
    }

    #[test]
    fn test_replay_many_workers() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 8);

        let trace: String = (0..5000).map(|i| format!("10.0.{}.{}\n", i / 256, i % 256)).collect();
        let summary = replay.run(Cursor::new(trace)).unwrap();

        assert_eq!(summary.packets, 5000);
        assert_eq!(registry.get(ClassLabel::ClassA), 5000);
    }

    #[test]
    fn test_replay_file() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 2);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "192.0.2.1\n198.51.100.1").unwrap();

        let summary = replay.run_path(file.path()).unwrap();
        assert_eq!(summary.packets, 2);
        assert_eq!(registry.get(ClassLabel::ClassC), 2);
    }

    #[test]
    fn test_missing_file() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 1);

        let err = replay.run_path(Path::new("/nonexistent/trace.txt")).unwrap_err();
        assert!(matches!(err, EngineError::ReplayFailed(_)));
    }

    #[tokio::test]
    async fn test_interrupt_while_reader_blocked() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 2);

        let (release, stalled) = mpsc::channel::<()>();
        let reader = BufReader::new(Cursor::new("10.0.0.1\n10.0.0.2\n").chain(Stalled(stalled)));

        let outcome = replay
            .run_until(reader, async {
                while registry.get(ClassLabel::ClassA) < 2 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await;

        assert!(matches!(outcome, ReplayOutcome::Interrupted));
        assert_eq!(registry.get(ClassLabel::ClassA), 2);
        drop(release);
    }

    #[tokio::test]
    async fn test_run_until_finishes_first() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 2);

        let outcome = replay
            .run_until(Cursor::new("200.0.0.1\n::1\n"), std::future::pending::<()>())
            .await;

        match outcome {
            ReplayOutcome::Finished(Ok(summary)) => assert_eq!(summary.packets, 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(registry.snapshot().total(), 2);
    }

    #[tokio::test]
    async fn test_run_path_until_missing_file() {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let replay = TraceReplay::new(engine(&registry), 1);

        let outcome = replay
            .run_path_until(PathBuf::from("/nonexistent/trace.txt"), std::future::pending::<()>())
            .await;

        assert!(matches!(
            outcome,
            ReplayOutcome::Finished(Err(EngineError::ReplayFailed(_)))
        ));
    }
}
