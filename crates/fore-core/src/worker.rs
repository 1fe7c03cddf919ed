//! Dedicated background thread for asynchronous task bodies.
//!
//! An asynchronous [`Executor`](crate::Executor) owns exactly one `Worker`.
//! Jobs sent to it run sequentially, in the order they were sent, on a single
//! named thread. Results travel back to the UI thread through the
//! [`MainLoop`](crate::MainLoop); the worker itself knows nothing about them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use fore_core::worker::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new().name("example-worker").build().unwrap();
//! let counter = Arc::new(AtomicI32::new(0));
//!
//! let counter_clone = counter.clone();
//! worker
//!     .send(move || {
//!         counter_clone.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .unwrap();
//!
//! // Graceful shutdown drains the queue first.
//! worker.stop_and_join();
//! assert_eq!(counter.load(Ordering::SeqCst), 1);
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::cancel::CancellationToken;
use crate::error::{ForeError, Result};

const TARGET: &str = crate::logging::targets::WORKER;

/// Default capacity for the worker's job queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for creating a Worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Capacity of the job queue.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "fore-worker".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating Workers with custom configuration.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a new WorkerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the worker thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the job queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Build and start the worker.
    pub fn build(self) -> Result<Worker> {
        Worker::with_config(self.config)
    }
}

/// A job sent to the worker.
type Job = Box<dyn FnOnce() + Send>;

enum WorkerMessage {
    Run(Job),
    Shutdown,
}

/// State shared between the Worker handle and its thread.
struct WorkerState {
    running: AtomicBool,
    cancellation: CancellationToken,
    pending_jobs: AtomicUsize,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            cancellation: CancellationToken::new(),
            pending_jobs: AtomicUsize::new(0),
        }
    }
}

/// A single dedicated thread with a FIFO job queue.
pub struct Worker {
    sender: Sender<WorkerMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<WorkerState>,
    name: String,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending_jobs", &self.pending_jobs())
            .finish()
    }
}

impl Worker {
    /// Start a worker with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(WorkerConfig::default())
    }

    /// Start a worker with custom configuration.
    ///
    /// A queue capacity of 0 is raised to 1: a rendezvous channel would
    /// reject every job the worker is not already waiting for.
    pub fn with_config(config: WorkerConfig) -> Result<Self> {
        if config.queue_capacity == 0 {
            tracing::warn!(target: TARGET, name = %config.name, "queue capacity 0 raised to 1");
        }
        let (sender, receiver) = bounded(config.queue_capacity.max(1));
        let state = Arc::new(WorkerState::new());
        let thread_state = state.clone();

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || {
                worker_loop(receiver, &thread_state);
                thread_state.running.store(false, Ordering::Release);
            })
            .map_err(|e| ForeError::WorkerSpawn(e.to_string()))?;

        tracing::debug!(target: TARGET, name = %config.name, "worker started");

        Ok(Self {
            sender,
            handle: Mutex::new(Some(handle)),
            state,
            name: config.name,
        })
    }

    /// The worker thread's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the worker is still accepting jobs.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Number of jobs queued or in progress.
    pub fn pending_jobs(&self) -> usize {
        self.state.pending_jobs.load(Ordering::Acquire)
    }

    /// Queue a job for execution on the worker thread.
    pub fn send<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return Err(ForeError::WorkerStopped);
        }

        self.state.pending_jobs.fetch_add(1, Ordering::AcqRel);

        match self.sender.try_send(WorkerMessage::Run(Box::new(job))) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.state.pending_jobs.fetch_sub(1, Ordering::AcqRel);
                tracing::warn!(target: TARGET, name = %self.name, "worker queue full, job rejected");
                Err(ForeError::WorkerQueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.state.pending_jobs.fetch_sub(1, Ordering::AcqRel);
                Err(ForeError::WorkerStopped)
            }
        }
    }

    /// Request the worker to stop after processing queued jobs.
    ///
    /// Non-blocking. New jobs are rejected from this point on.
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::Release);
        self.state.cancellation.cancel();
        let _ = self.sender.try_send(WorkerMessage::Shutdown);
    }

    /// Wait for the worker thread to finish.
    ///
    /// Returns `true` if the worker was joined successfully, `false` if
    /// already joined or the thread panicked.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
        // Don't block in drop - just request shutdown
    }
}

/// The main worker loop.
fn worker_loop(receiver: Receiver<WorkerMessage>, state: &WorkerState) {
    loop {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(WorkerMessage::Run(job)) => run_job(job, state),
            Ok(WorkerMessage::Shutdown) => {
                // Drain whatever was queued before the shutdown request.
                while let Ok(message) = receiver.try_recv() {
                    if let WorkerMessage::Run(job) = message {
                        run_job(job, state);
                    }
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if state.cancellation.is_cancelled()
                    && state.pending_jobs.load(Ordering::Acquire) == 0
                {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!(target: TARGET, "worker loop exited");
}

fn run_job(job: Job, state: &WorkerState) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!(target: TARGET, "job panicked on worker thread");
    }
    state.pending_jobs.fetch_sub(1, Ordering::AcqRel);
}
