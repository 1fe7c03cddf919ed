//! The component that carries a [`WorkMode`] and runs tasks under it.
//!
//! Models take an `Executor` in their constructor and start all of their
//! background work through it, so switching a whole application to
//! synchronous execution for tests is a one-line change at the composition
//! root.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use fore_core::Executor;
//!
//! let executor = Executor::synchronous();
//! let total = Arc::new(AtomicUsize::new(0));
//!
//! let total_clone = total.clone();
//! executor
//!     .task::<usize, (), usize>()
//!     .do_in_background(|n, _| n * 2)
//!     .on_post_execute(move |doubled| total_clone.store(doubled, Ordering::SeqCst))
//!     .execute(21)
//!     .unwrap();
//!
//! // Synchronous: post-execute has already run.
//! assert_eq!(total.load(Ordering::SeqCst), 42);
//! ```

use std::sync::Arc;

use crate::builder::TaskBuilder;
use crate::error::{ForeError, Result};
use crate::main_loop::MainHandle;
use crate::work_mode::WorkMode;
use crate::worker::{Worker, WorkerConfig};

struct ExecutorInner {
    work_mode: WorkMode,
    main: Option<MainHandle>,
    worker: Option<Worker>,
}

/// Runs tasks synchronously or on a dedicated worker thread.
///
/// Cloning is cheap; clones share the same worker thread. The worker is
/// asked to stop once the last clone is dropped.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<ExecutorInner>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("work_mode", &self.inner.work_mode)
            .field("worker", &self.inner.worker)
            .finish()
    }
}

impl Executor {
    /// An executor that runs every phase inline on the calling thread.
    pub fn synchronous() -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                work_mode: WorkMode::Synchronous,
                main: None,
                worker: None,
            }),
        }
    }

    /// An executor with its own worker thread delivering callbacks to `main`.
    pub fn asynchronous(main: MainHandle) -> Result<Self> {
        ExecutorBuilder::new()
            .work_mode(WorkMode::Asynchronous)
            .main_handle(main)
            .build()
    }

    /// Start configuring an executor.
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// The work mode fixed at construction.
    pub fn work_mode(&self) -> WorkMode {
        self.inner.work_mode
    }

    /// The main loop callbacks are delivered to, if asynchronous.
    pub fn main_handle(&self) -> Option<&MainHandle> {
        self.inner.main.as_ref()
    }

    /// Start building a task that runs on this executor.
    pub fn task<I, P, R>(&self) -> TaskBuilder<I, P, R>
    where
        I: Send + 'static,
        P: Send + 'static,
        R: Send + 'static,
    {
        TaskBuilder::new(self)
    }

    /// Queue a job on the worker thread.
    pub(crate) fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.inner.worker {
            Some(worker) => worker.send(job),
            None => {
                // Synchronous executors have no worker: run in place.
                job();
                Ok(())
            }
        }
    }
}

/// Builder for [`Executor`].
#[derive(Debug, Default)]
pub struct ExecutorBuilder {
    work_mode: WorkMode,
    main: Option<MainHandle>,
    worker: WorkerConfig,
}

impl ExecutorBuilder {
    /// Defaults: asynchronous, default worker configuration, no main handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the work mode.
    pub fn work_mode(mut self, work_mode: WorkMode) -> Self {
        self.work_mode = work_mode;
        self
    }

    /// Set the main loop asynchronous callbacks are delivered to.
    pub fn main_handle(mut self, main: MainHandle) -> Self {
        self.main = Some(main);
        self
    }

    /// Replace the worker thread configuration.
    pub fn worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker = config;
        self
    }

    /// Set the worker thread's name.
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker.name = name.into();
        self
    }

    /// Build the executor.
    ///
    /// Asynchronous mode starts the worker thread and fails with
    /// [`ForeError::MissingDispatcher`] if no main handle was given.
    pub fn build(self) -> Result<Executor> {
        let worker = match self.work_mode {
            WorkMode::Synchronous => None,
            WorkMode::Asynchronous => {
                if self.main.is_none() {
                    return Err(ForeError::MissingDispatcher);
                }
                Some(Worker::with_config(self.worker)?)
            }
        };

        tracing::debug!(target: crate::logging::targets::TASK, work_mode = %self.work_mode, "executor built");

        Ok(Executor {
            inner: Arc::new(ExecutorInner {
                work_mode: self.work_mode,
                main: self.main,
                worker,
            }),
        })
    }
}

static_assertions::assert_impl_all!(Executor: Send, Sync, Clone);
