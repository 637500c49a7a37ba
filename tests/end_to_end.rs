// tests/end_to_end.rs
//! End-to-end classification scenarios

use egress_classifier::classifier::ClassLabel;
use egress_classifier::counters::{CounterRegistry, SaturatingCounter};
use egress_classifier::engine::{ClassificationEngine, Disposition, Packet, SignalSink};
use egress_classifier::interception::{ReplayOutcome, TraceReplay};
use egress_classifier::signals::{SignalDispatcher, SignalQueue};
use egress_classifier::stats::StatsReporter;
use egress_classifier::threshold::{ShapingSignal, ThresholdMonitor};
use std::io::{BufReader, Cursor, Read};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct CollectingSink(Mutex<Vec<ShapingSignal>>);

impl CollectingSink {
    fn signals(&self) -> Vec<ShapingSignal> {
        self.0.lock().unwrap().clone()
    }
}

impl SignalSink for CollectingSink {
    fn emit(&self, signal: ShapingSignal) {
        self.0.lock().unwrap().push(signal);
    }
}

struct Harness {
    registry: Arc<CounterRegistry>,
    sink: Arc<CollectingSink>,
    engine: ClassificationEngine,
    reporter: StatsReporter,
}

impl Harness {
    fn new() -> Self {
        let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
        let sink = Arc::new(CollectingSink::default());
        let engine = ClassificationEngine::new(
            Arc::clone(&registry),
            ThresholdMonitor::default(),
            sink.clone(),
        );
        let reporter = StatsReporter::new(Arc::clone(&registry));

        Self {
            registry,
            sink,
            engine,
            reporter,
        }
    }

    fn send_v4(&self, id: u64, first_octet: u8) -> Disposition {
        let packet = Packet::new(id, Ipv4Addr::new(first_octet, 1, 2, 3));
        self.engine.process(Some(&packet))
    }
}

#[test]
fn test_mixed_classes_report() {
    let harness = Harness::new();

    for (id, octet) in [10u8, 200, 150, 95].into_iter().enumerate() {
        assert_eq!(harness.send_v4(id as u64, octet), Disposition::Allow);
    }

    let snapshot = harness.registry.snapshot();
    assert_eq!(snapshot.get(ClassLabel::ClassA), 2);
    assert_eq!(snapshot.get(ClassLabel::ClassB), 1);
    assert_eq!(snapshot.get(ClassLabel::ClassC), 1);
    assert_eq!(snapshot.get(ClassLabel::V6), 0);

    assert_eq!(
        harness.reporter.render(),
        "IPv4 Class A: 2\nIPv4 Class B: 1\nIPv4 Class C: 1\nIPv6 Packets: 0\n"
    );
    assert!(harness.sink.signals().is_empty());
}

#[test]
fn test_class_a_signals_on_sixteenth_packet() {
    let harness = Harness::new();

    for id in 1..=15 {
        harness.send_v4(id, 50);
        assert!(
            harness.sink.signals().is_empty(),
            "packet {} must not signal",
            id
        );
    }

    assert_eq!(harness.send_v4(16, 50), Disposition::Allow);

    let signals = harness.sink.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].label, ClassLabel::ClassA);
    assert_eq!(signals[0].count, 16);
    assert_eq!(signals[0].threshold, 15);
}

#[test]
fn test_signal_repeats_past_threshold() {
    let harness = Harness::new();

    for id in 1..=20 {
        harness.send_v4(id, 130);
    }

    // Class B threshold 10: counts 11..=20 each signal
    let counts: Vec<u64> = harness.sink.signals().iter().map(|s| s.count).collect();
    assert_eq!(counts, (11..=20).collect::<Vec<_>>());
}

#[test]
fn test_unknown_class_is_counted_but_hidden() {
    let harness = Harness::new();

    for id in 0..5000 {
        let octet = if id % 2 == 0 { 0 } else { 240 };
        assert_eq!(harness.send_v4(id, octet), Disposition::Allow);
    }

    assert_eq!(harness.registry.get(ClassLabel::ClassUnknownV4), 5000);
    assert!(harness.sink.signals().is_empty());
    assert_eq!(
        harness.reporter.render(),
        "IPv4 Class A: 0\nIPv4 Class B: 0\nIPv4 Class C: 0\nIPv6 Packets: 0\n"
    );
}

#[test]
fn test_ipv6_threshold() {
    let harness = Harness::new();

    for id in 1..=6 {
        let packet = Packet::new(id, Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, id as u16));
        harness.engine.process(Some(&packet));
    }

    let signals = harness.sink.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].label, ClassLabel::V6);
    assert!(harness.reporter.render().contains("IPv6 Packets: 6"));
}

#[test]
fn test_absent_packets_leave_state_untouched() {
    let harness = Harness::new();
    let before = harness.reporter.render();

    for _ in 0..100 {
        assert_eq!(harness.engine.process(None), Disposition::Allow);
    }

    assert_eq!(harness.registry.snapshot().total(), 0);
    assert_eq!(harness.reporter.render(), before);
}

#[test]
fn test_render_twice_is_identical() {
    let harness = Harness::new();
    harness.send_v4(1, 10);
    harness.send_v4(2, 199);

    let first = harness.reporter.render();
    let second = harness.reporter.render();
    assert_eq!(first, second);
    assert_eq!(harness.registry.get(ClassLabel::ClassA), 1);
}

#[test]
fn test_concurrent_process_loses_no_updates() {
    let harness = Arc::new(Harness::new());
    let threads = 8;
    let per_thread = 2500u64;
    let mut handles = vec![];

    for t in 0..threads {
        let h = Arc::clone(&harness);
        handles.push(thread::spawn(move || {
            for i in 0..per_thread {
                h.send_v4(t * per_thread + i, 20);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let total = threads * per_thread;
    assert_eq!(harness.registry.get(ClassLabel::ClassA), total);

    // One signal per count in 16..=total, none duplicated
    let mut counts: Vec<u64> = harness.sink.signals().iter().map(|s| s.count).collect();
    counts.sort_unstable();
    assert_eq!(counts, (16..=total).collect::<Vec<_>>());
}

#[test]
fn test_wraparound_at_counter_limit() {
    let registry: Arc<CounterRegistry> =
        Arc::new(CounterRegistry::seeded(&[(ClassLabel::ClassC, u64::MAX - 1)]));
    let sink = Arc::new(CollectingSink::default());
    let engine = ClassificationEngine::new(
        Arc::clone(&registry),
        ThresholdMonitor::default(),
        sink.clone(),
    );

    for id in 0..3 {
        engine.process(Some(&Packet::new(id, Ipv4Addr::new(192, 0, 2, 1))));
    }

    // MAX signals, then the counter wraps to 0 and 1, both below threshold
    assert_eq!(registry.get(ClassLabel::ClassC), 1);
    let counts: Vec<u64> = sink.signals().iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![u64::MAX]);
}

#[test]
fn test_saturating_registry_keeps_signalling() {
    let registry: Arc<CounterRegistry<SaturatingCounter>> =
        Arc::new(CounterRegistry::seeded(&[(ClassLabel::ClassC, u64::MAX - 1)]));
    let sink = Arc::new(CollectingSink::default());
    let engine = ClassificationEngine::new(
        Arc::clone(&registry),
        ThresholdMonitor::default(),
        sink.clone(),
    );

    for id in 0..3 {
        engine.process(Some(&Packet::new(id, Ipv4Addr::new(192, 0, 2, 1))));
    }

    assert_eq!(registry.get(ClassLabel::ClassC), u64::MAX);
    assert_eq!(sink.signals().len(), 3);
}

#[tokio::test]
async fn test_signals_reach_dispatcher() {
    let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
    let queue = Arc::new(SignalQueue::new(64));
    let engine = ClassificationEngine::new(
        Arc::clone(&registry),
        ThresholdMonitor::default(),
        queue.clone(),
    );

    let mut dispatcher = SignalDispatcher::new(Arc::clone(&queue), Duration::from_millis(5));
    let mut records = dispatcher.subscribe();
    dispatcher.start();

    for id in 1..=9 {
        engine.process(Some(&Packet::new(id, Ipv4Addr::new(220, 0, 0, id as u8))));
    }

    // Class C threshold 7: counts 8 and 9
    for expected in [8, 9] {
        let record = tokio::time::timeout(Duration::from_secs(2), records.recv())
            .await
            .expect("signal not dispatched in time")
            .unwrap();
        assert_eq!(record.label, ClassLabel::ClassC);
        assert_eq!(record.count, expected);
    }

    let stats = dispatcher.shutdown().await;
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.dropped, 0);
}

/// Trace source that stays open until its sender is dropped
struct HeldOpen(mpsc::Receiver<()>);

impl Read for HeldOpen {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

#[tokio::test]
async fn test_interrupted_replay_still_drains_signals() {
    let registry: Arc<CounterRegistry> = Arc::new(CounterRegistry::new());
    let queue = Arc::new(SignalQueue::new(64));
    let engine = Arc::new(ClassificationEngine::new(
        Arc::clone(&registry),
        ThresholdMonitor::default(),
        queue.clone(),
    ));

    // Periodic drains are rare; the final drain picks up the rest
    let mut dispatcher = SignalDispatcher::new(Arc::clone(&queue), Duration::from_secs(3600));
    dispatcher.start();

    let trace: String = (1..=20).map(|i| format!("10.0.0.{}\n", i)).collect();
    let (release, held) = mpsc::channel::<()>();
    let reader = BufReader::new(Cursor::new(trace).chain(HeldOpen(held)));

    let replay = TraceReplay::new(engine, 4);
    let outcome = replay
        .run_until(reader, async {
            while registry.get(ClassLabel::ClassA) < 20 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
    assert!(matches!(outcome, ReplayOutcome::Interrupted));

    let stats = dispatcher.shutdown().await;
    // Class A threshold 15: counts 16..=20
    assert_eq!(stats.dispatched, 5);
    assert_eq!(stats.dropped, 0);
    assert!(queue.is_empty());

    let report = StatsReporter::new(Arc::clone(&registry)).render();
    assert!(report.starts_with("IPv4 Class A: 20\n"));
    drop(release);
}
