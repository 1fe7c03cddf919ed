//! Counter scenarios in both work modes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fore_core::{
    Executor, ForeError, MainLoop, NoDelay, Observable, Observer, RecordingDelay, WorkMode,
    WorkerConfig,
};
use fore_samples::Counter;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    busy: bool,
    progress: u32,
    count: u32,
}

fn record(counter: &Counter) -> (Arc<dyn Observer>, Arc<Mutex<Vec<Snapshot>>>) {
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let snapshots_clone = snapshots.clone();
    let watched = counter.clone();
    let observer: Arc<dyn Observer> = Arc::new(move || {
        snapshots_clone.lock().push(Snapshot {
            busy: watched.is_busy(),
            progress: watched.progress(),
            count: watched.count(),
        });
    });
    counter.add_observer(&observer);
    (observer, snapshots)
}

/// Gate that holds the worker's first job until opened.
type Gate = Arc<(Mutex<bool>, Condvar)>;

fn open_gate(gate: &Gate) {
    *gate.0.lock() = true;
    gate.1.notify_all();
}

/// An asynchronous executor whose single-slot queue is already full.
fn saturated_executor(main_loop: &MainLoop) -> (Executor, Gate) {
    let executor = Executor::builder()
        .work_mode(WorkMode::Asynchronous)
        .main_handle(main_loop.handle())
        .worker_config(WorkerConfig {
            queue_capacity: 1,
            ..WorkerConfig::default()
        })
        .build()
        .unwrap();
    let gate: Gate = Arc::new((Mutex::new(false), Condvar::new()));
    let started = Arc::new(AtomicBool::new(false));

    let blocking_gate = gate.clone();
    let started_clone = started.clone();
    executor
        .task::<(), (), ()>()
        .do_in_background(move |(), _| {
            started_clone.store(true, Ordering::SeqCst);
            let (open, condvar) = &*blocking_gate;
            let mut open = open.lock();
            while !*open {
                condvar.wait(&mut open);
            }
        })
        .execute(())
        .unwrap();
    while !started.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(1));
    }
    executor
        .task::<(), (), ()>()
        .do_in_background(|(), _| {})
        .execute(())
        .unwrap();
    (executor, gate)
}

fn assert_slow_increase(snapshots: &[Snapshot]) {
    // Start, one per progress step, finish.
    assert_eq!(snapshots.len(), 22);

    let first = snapshots[0];
    assert!(first.busy);
    assert_eq!(first.count, 0);

    let progress: Vec<u32> = snapshots[1..21].iter().map(|s| s.progress).collect();
    assert_eq!(progress, (1..=20).collect::<Vec<_>>());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(snapshots[1..21].iter().all(|s| s.busy && s.count == 0));

    let last = snapshots[21];
    assert!(!last.busy);
    assert_eq!(last.count, 20);
}

#[test]
fn test_synchronous_increase_by_20() {
    let delay = Arc::new(RecordingDelay::new());
    let counter = Counter::new(Executor::synchronous(), delay.clone(), Duration::from_millis(50));
    let (_observer, snapshots) = record(&counter);

    assert_eq!(counter.count(), 0);
    counter.increase_by_20().unwrap();

    // Synchronous: the final state is visible on the next line.
    assert_eq!(counter.count(), 20);
    assert!(!counter.is_busy());
    assert_slow_increase(&snapshots.lock());
    assert_eq!(delay.pauses().len(), 20);
}

#[test]
fn test_asynchronous_increase_by_20() {
    let main_loop = MainLoop::new();
    let executor = Executor::asynchronous(main_loop.handle()).unwrap();
    let counter = Counter::new(executor, Arc::new(NoDelay), Duration::from_millis(50));
    let (_observer, snapshots) = record(&counter);

    counter.increase_by_20().unwrap();
    assert!(counter.is_busy());

    assert!(main_loop.run_until(|| !counter.is_busy(), Duration::from_secs(5)));
    assert_eq!(counter.count(), 20);
    assert_slow_increase(&snapshots.lock());
}

#[test]
fn test_busy_counter_ignores_more_work() {
    let main_loop = MainLoop::new();
    let executor = Executor::asynchronous(main_loop.handle()).unwrap();
    let counter = Counter::new(executor, Arc::new(NoDelay), Duration::ZERO);

    counter.increase_by_20().unwrap();
    counter.increase_by_20().unwrap();
    counter.increase_by_1();

    assert!(main_loop.run_until(|| !counter.is_busy(), Duration::from_secs(5)));
    main_loop.process_pending();
    assert_eq!(counter.count(), 20);
}

#[test]
fn test_rejected_launch_clears_busy() {
    let main_loop = MainLoop::new();
    let (executor, gate) = saturated_executor(&main_loop);
    let counter = Counter::new(executor, Arc::new(NoDelay), Duration::ZERO);
    let (_observer, snapshots) = record(&counter);

    assert_eq!(counter.increase_by_20(), Err(ForeError::WorkerQueueFull));
    assert!(!counter.is_busy());
    assert_eq!(counter.count(), 0);
    let busy: Vec<bool> = snapshots.lock().iter().map(|s| s.busy).collect();
    assert_eq!(busy, vec![true, false]);

    // A later increase goes through once the queue drains.
    open_gate(&gate);
    main_loop.process_pending();
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while counter.increase_by_20().is_err() && std::time::Instant::now() < deadline {
        main_loop.process_pending();
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(main_loop.run_until(|| !counter.is_busy(), Duration::from_secs(5)));
    assert_eq!(counter.count(), 20);
}
