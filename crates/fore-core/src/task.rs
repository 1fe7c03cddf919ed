//! Single-use three-phase tasks.
//!
//! A [`Task`] runs `pre-execute`, then `do-work` (which may publish progress
//! any number of times), then `post-execute`. How the phases are scheduled
//! depends on the [`WorkMode`] of the [`Executor`] that built it:
//!
//! | phase        | Synchronous       | Asynchronous                         |
//! |--------------|-------------------|--------------------------------------|
//! | pre-execute  | calling thread    | calling thread, before `execute` returns |
//! | do-work      | calling thread    | executor's worker thread             |
//! | progress     | calling thread    | main loop, in publication order      |
//! | post-execute | calling thread    | main loop, after every progress      |
//!
//! In synchronous mode `execute` returns only once post-execute has run, so
//! the line after it already sees the final state.
//!
//! # State Machine
//!
//! ```text
//! Created -> PreExecute -> Working -> PostExecute -> Completed
//!                              \-> Failed
//!                              \-> Cancelled
//! ```
//!
//! Tasks are single-use: a second `execute` fails with
//! [`ForeError::AlreadyExecuted`]. Tasks are normally created through
//! [`TaskBuilder`](crate::TaskBuilder).

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::cancel::CancellationToken;
use crate::error::{ForeError, Result};
use crate::executor::Executor;
use crate::logging::PerfSpan;
use crate::main_loop::MainHandle;
use crate::work_mode::WorkMode;

const TARGET: &str = crate::logging::targets::TASK;

pub(crate) type PreFn = Box<dyn FnOnce() + Send>;
pub(crate) type WorkFn<I, P, R> = Box<dyn FnOnce(I, &ProgressPublisher<P>) -> R + Send>;
pub(crate) type ProgressFn<P> = Arc<dyn Fn(P) + Send + Sync>;
pub(crate) type PostFn<R> = Box<dyn FnOnce(R) + Send>;
pub(crate) type FailureFn = Box<dyn FnOnce(ForeError) + Send>;
pub(crate) type CancelledFn = Box<dyn FnOnce() + Send>;

/// A unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Built, not yet executed.
    Created = 0,
    /// Running the pre-execute callback.
    PreExecute = 1,
    /// Work queued or running.
    Working = 2,
    /// Running the post-execute callback.
    PostExecute = 3,
    /// Post-execute finished.
    Completed = 4,
    /// Work panicked.
    Failed = 5,
    /// Cancelled before work finished; post-execute was skipped.
    Cancelled = 6,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::PreExecute,
            2 => Self::Working,
            3 => Self::PostExecute,
            4 => Self::Completed,
            5 => Self::Failed,
            _ => Self::Cancelled,
        }
    }

    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The callbacks a task was built with.
pub(crate) struct TaskCallbacks<I, P, R> {
    pub(crate) pre: Option<PreFn>,
    pub(crate) work: WorkFn<I, P, R>,
    pub(crate) progress: Option<ProgressFn<P>>,
    pub(crate) post: Option<PostFn<R>>,
    pub(crate) failure: Option<FailureFn>,
    pub(crate) cancelled: Option<CancelledFn>,
}

/// State shared between a task handle and the closures it schedules.
struct TaskShared {
    id: TaskId,
    state: AtomicU8,
    cancellation: CancellationToken,
}

impl TaskShared {
    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
        tracing::trace!(target: TARGET, task = self.id.as_u64(), ?state, "task state");
    }
}

/// Handed to `do-work` for publishing progress and checking cancellation.
pub struct ProgressPublisher<P> {
    sink: ProgressSink<P>,
    cancellation: CancellationToken,
}

enum ProgressSink<P> {
    /// Deliver on the current thread.
    Inline(Option<ProgressFn<P>>),
    /// Post to the main loop.
    Posted {
        main: MainHandle,
        callback: Option<ProgressFn<P>>,
    },
}

impl<P: Send + 'static> ProgressPublisher<P> {
    /// Publish a progress value.
    ///
    /// Synchronous tasks call the progress callback before this returns.
    /// Asynchronous tasks queue it on the main loop; queued updates are
    /// delivered in the order they were published and before post-execute.
    pub fn publish(&self, progress: P) {
        match &self.sink {
            ProgressSink::Inline(Some(callback)) => callback(progress),
            ProgressSink::Posted {
                main,
                callback: Some(callback),
            } => {
                let callback = callback.clone();
                if let Err(err) = main.post(move || callback(progress)) {
                    tracing::error!(target: TARGET, %err, "progress update could not be delivered");
                }
            }
            _ => {}
        }
    }

    /// Whether the task has been asked to cancel.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// A single-use unit of work with pre, work, progress and post phases.
///
/// `I` is the input handed to `execute`, `P` the progress type and `R` the
/// result passed to post-execute.
pub struct Task<I, P, R> {
    shared: Arc<TaskShared>,
    callbacks: Mutex<Option<TaskCallbacks<I, P, R>>>,
    executor: Executor,
}

impl<I, P, R> std::fmt::Debug for Task<I, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.shared.id)
            .field("state", &self.shared.state())
            .field("work_mode", &self.executor.work_mode())
            .finish()
    }
}

impl<I, P, R> Task<I, P, R>
where
    I: Send + 'static,
    P: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(executor: Executor, callbacks: TaskCallbacks<I, P, R>) -> Self {
        Self {
            shared: Arc::new(TaskShared {
                id: next_task_id(),
                state: AtomicU8::new(TaskState::Created as u8),
                cancellation: CancellationToken::new(),
            }),
            callbacks: Mutex::new(Some(callbacks)),
            executor,
        }
    }

    /// This task's id.
    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// The work mode this task runs in.
    pub fn work_mode(&self) -> WorkMode {
        self.executor.work_mode()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancellation.is_cancelled()
    }

    /// A token that cancels this task when cancelled.
    ///
    /// Useful when the task handle itself is not reachable from the code that
    /// wants to cancel.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancellation.clone()
    }

    /// Request cancellation.
    ///
    /// Advisory only: work keeps running until it checks
    /// [`ProgressPublisher::is_cancelled`]. In asynchronous mode, a task
    /// cancelled before post-execute starts on the main loop skips
    /// post-execute and runs its `on_cancelled` callback instead. This holds
    /// even when the work has already returned and its result is queued.
    /// Synchronous tasks have already finished by the time anyone can call
    /// this, so the request has no effect. Returns `true` if the request can
    /// still change the outcome.
    pub fn cancel(&self) -> bool {
        let state = self.state();
        if self.work_mode().is_synchronous()
            || state.is_terminal()
            || state == TaskState::PostExecute
        {
            tracing::trace!(target: TARGET, task = self.id().as_u64(), ?state, "cancel has no effect");
            return false;
        }
        self.shared.cancellation.cancel();
        tracing::debug!(target: TARGET, task = self.id().as_u64(), "task cancellation requested");
        true
    }

    /// Run the task. May be called once.
    ///
    /// Fails with [`ForeError::AlreadyExecuted`] on a second call, or with a
    /// worker error if an asynchronous task could not be queued.
    pub fn execute(&self, input: I) -> Result<()> {
        let callbacks = self
            .callbacks
            .lock()
            .take()
            .ok_or(ForeError::AlreadyExecuted)?;

        tracing::debug!(
            target: TARGET,
            task = self.id().as_u64(),
            work_mode = %self.work_mode(),
            "executing task"
        );

        match self.work_mode() {
            WorkMode::Synchronous => {
                run_synchronously(&self.shared, callbacks, input);
                Ok(())
            }
            WorkMode::Asynchronous => self.run_asynchronously(callbacks, input),
        }
    }

    fn run_asynchronously(&self, callbacks: TaskCallbacks<I, P, R>, input: I) -> Result<()> {
        let main = self
            .executor
            .main_handle()
            .cloned()
            .ok_or(ForeError::MissingDispatcher)?;

        let TaskCallbacks {
            pre,
            work,
            progress,
            post,
            failure,
            cancelled,
        } = callbacks;

        self.shared.set_state(TaskState::PreExecute);
        if let Some(pre) = pre {
            pre();
        }
        self.shared.set_state(TaskState::Working);

        let shared = self.shared.clone();
        let publisher = ProgressPublisher {
            sink: ProgressSink::Posted {
                main: main.clone(),
                callback: progress,
            },
            cancellation: shared.cancellation.clone(),
        };

        let job = move || {
            let finish = if shared.cancellation.is_cancelled() {
                Finish::Cancelled
            } else {
                let _span = PerfSpan::new("task_work");
                match catch_unwind(AssertUnwindSafe(|| work(input, &publisher))) {
                    Ok(_) if shared.cancellation.is_cancelled() => Finish::Cancelled,
                    Ok(result) => Finish::Done(result),
                    Err(payload) => Finish::Panicked(payload),
                }
            };

            let delivery = match finish {
                Finish::Done(result) => {
                    let shared = shared.clone();
                    main.post(move || {
                        // Cancellation may have arrived while the outcome was queued.
                        if shared.cancellation.is_cancelled() {
                            finish_cancelled(&shared, cancelled);
                            return;
                        }
                        shared.set_state(TaskState::PostExecute);
                        if let Some(post) = post {
                            post(result);
                        }
                        shared.set_state(TaskState::Completed);
                    })
                }
                Finish::Cancelled => {
                    let shared = shared.clone();
                    main.post(move || finish_cancelled(&shared, cancelled))
                }
                Finish::Panicked(payload) => {
                    let shared = shared.clone();
                    main.post(move || deliver_failure(&shared, failure, payload))
                }
            };

            if let Err(err) = delivery {
                tracing::error!(
                    target: TARGET,
                    task = shared.id.as_u64(),
                    %err,
                    "task outcome could not be delivered to the main loop"
                );
            }
        };

        if let Err(err) = self.executor.spawn(job) {
            self.shared.set_state(TaskState::Failed);
            tracing::error!(target: TARGET, task = self.id().as_u64(), %err, "task could not be queued");
            return Err(err);
        }
        Ok(())
    }
}

fn finish_cancelled(shared: &TaskShared, cancelled: Option<CancelledFn>) {
    shared.set_state(TaskState::Cancelled);
    if let Some(cancelled) = cancelled {
        cancelled();
    }
}

/// How do-work ended on the worker thread.
enum Finish<R> {
    Done(R),
    Cancelled,
    Panicked(Box<dyn Any + Send>),
}

fn run_synchronously<I, P, R>(shared: &TaskShared, callbacks: TaskCallbacks<I, P, R>, input: I)
where
    P: Send + 'static,
{
    let TaskCallbacks {
        pre,
        work,
        progress,
        post,
        failure,
        cancelled: _,
    } = callbacks;

    shared.set_state(TaskState::PreExecute);
    if let Some(pre) = pre {
        pre();
    }

    shared.set_state(TaskState::Working);
    let publisher = ProgressPublisher {
        sink: ProgressSink::Inline(progress),
        cancellation: shared.cancellation.clone(),
    };
    let outcome = {
        let _span = PerfSpan::new("task_work");
        catch_unwind(AssertUnwindSafe(|| work(input, &publisher)))
    };

    match outcome {
        Ok(result) => {
            shared.set_state(TaskState::PostExecute);
            if let Some(post) = post {
                post(result);
            }
            shared.set_state(TaskState::Completed);
        }
        Err(payload) => deliver_failure(shared, failure, payload),
    }
}

/// Route a panic from do-work to `on_failure`, or re-raise it on this thread.
fn deliver_failure(shared: &TaskShared, failure: Option<FailureFn>, payload: Box<dyn Any + Send>) {
    shared.set_state(TaskState::Failed);
    let message = panic_message(payload.as_ref());
    tracing::warn!(target: TARGET, task = shared.id.as_u64(), %message, "task work failed");
    match failure {
        Some(failure) => failure(ForeError::WorkPanicked(message)),
        None => resume_unwind(payload),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
