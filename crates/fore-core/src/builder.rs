//! Fluent construction of [`Task`]s.
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use fore_core::{Executor, ProgressPublisher};
//!
//! let executor = Executor::synchronous();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let progress_seen = seen.clone();
//! let post_seen = seen.clone();
//! executor
//!     .task::<(), u32, &'static str>()
//!     .on_pre_execute(|| {})
//!     .do_in_background(|(), publisher: &ProgressPublisher<u32>| {
//!         publisher.publish(50);
//!         publisher.publish(100);
//!         "done"
//!     })
//!     .on_progress_update(move |percent| progress_seen.lock().push(percent.to_string()))
//!     .on_post_execute(move |msg| post_seen.lock().push(msg.to_string()))
//!     .execute(())
//!     .unwrap();
//!
//! assert_eq!(*seen.lock(), vec!["50", "100", "done"]);
//! ```

use std::sync::Arc;

use crate::error::{ForeError, Result};
use crate::executor::Executor;
use crate::task::{
    CancelledFn, FailureFn, PostFn, PreFn, ProgressFn, ProgressPublisher, Task, TaskCallbacks,
    WorkFn,
};

/// Collects task callbacks before a single terminal `execute`.
///
/// Only [`do_in_background`](Self::do_in_background) is required.
pub struct TaskBuilder<I, P, R> {
    executor: Executor,
    pre: Option<PreFn>,
    work: Option<WorkFn<I, P, R>>,
    progress: Option<ProgressFn<P>>,
    post: Option<PostFn<R>>,
    failure: Option<FailureFn>,
    cancelled: Option<CancelledFn>,
}

impl<I, P, R> TaskBuilder<I, P, R>
where
    I: Send + 'static,
    P: Send + 'static,
    R: Send + 'static,
{
    /// Start a builder for tasks on `executor`.
    pub fn new(executor: &Executor) -> Self {
        Self {
            executor: executor.clone(),
            pre: None,
            work: None,
            progress: None,
            post: None,
            failure: None,
            cancelled: None,
        }
    }

    /// Runs on the calling thread before any work starts.
    pub fn on_pre_execute<F>(mut self, pre: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.pre = Some(Box::new(pre));
        self
    }

    /// The work itself. Runs on the worker thread in asynchronous mode.
    pub fn do_in_background<F>(mut self, work: F) -> Self
    where
        F: FnOnce(I, &ProgressPublisher<P>) -> R + Send + 'static,
    {
        self.work = Some(Box::new(work));
        self
    }

    /// Receives every value passed to [`ProgressPublisher::publish`], in order.
    pub fn on_progress_update<F>(mut self, progress: F) -> Self
    where
        F: Fn(P) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Receives the work's result once it returns.
    pub fn on_post_execute<F>(mut self, post: F) -> Self
    where
        F: FnOnce(R) + Send + 'static,
    {
        self.post = Some(Box::new(post));
        self
    }

    /// Receives [`ForeError::WorkPanicked`] if the work panics.
    ///
    /// Without this callback the panic is re-raised: on the calling thread in
    /// synchronous mode, on the main loop in asynchronous mode.
    pub fn on_failure<F>(mut self, failure: F) -> Self
    where
        F: FnOnce(ForeError) + Send + 'static,
    {
        self.failure = Some(Box::new(failure));
        self
    }

    /// Runs instead of post-execute when an asynchronous task is cancelled.
    pub fn on_cancelled<F>(mut self, cancelled: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancelled = Some(Box::new(cancelled));
        self
    }

    /// Build the task without running it.
    ///
    /// Fails with [`ForeError::MissingBackgroundWork`] if no work was set.
    pub fn build(self) -> Result<Task<I, P, R>> {
        let work = self.work.ok_or(ForeError::MissingBackgroundWork)?;
        Ok(Task::new(
            self.executor,
            TaskCallbacks {
                pre: self.pre,
                work,
                progress: self.progress,
                post: self.post,
                failure: self.failure,
                cancelled: self.cancelled,
            },
        ))
    }

    /// Build the task and run it with `input`.
    ///
    /// Returns the task handle so the caller can watch its state or cancel it.
    pub fn execute(self, input: I) -> Result<Task<I, P, R>> {
        let task = self.build()?;
        task.execute(input)?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_loop::MainLoop;
    use crate::task::TaskState;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_execute_without_work_fails() {
        let executor = Executor::synchronous();
        let pre_ran = Arc::new(AtomicBool::new(false));

        let pre_clone = pre_ran.clone();
        let result = executor
            .task::<(), (), ()>()
            .on_pre_execute(move || pre_clone.store(true, Ordering::SeqCst))
            .execute(());

        assert!(matches!(result, Err(ForeError::MissingBackgroundWork)));
        assert!(!pre_ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_only_work_is_required() {
        let executor = Executor::synchronous();
        let ran = Arc::new(AtomicBool::new(false));

        let ran_clone = ran.clone();
        let task = executor
            .task::<(), (), ()>()
            .do_in_background(move |(), _| ran_clone.store(true, Ordering::SeqCst))
            .execute(())
            .unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(task.state(), TaskState::Completed);
    }

    #[test]
    fn test_built_task_is_single_use() {
        let executor = Executor::synchronous();
        let runs = Arc::new(AtomicUsize::new(0));

        let runs_clone = runs.clone();
        let task = executor
            .task::<(), (), ()>()
            .do_in_background(move |(), _| {
                runs_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        assert_eq!(task.state(), TaskState::Created);
        task.execute(()).unwrap();
        assert_eq!(task.execute(()), Err(ForeError::AlreadyExecuted));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_synchronous_final_state_visible_after_execute() {
        let executor = Executor::synchronous();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        executor
            .task::<usize, (), usize>()
            .do_in_background(|step, _| step * 10)
            .on_post_execute(move |delta| {
                count_clone.fetch_add(delta, Ordering::SeqCst);
            })
            .execute(2)
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_asynchronous_progress_order_and_post_last() {
        let main_loop = MainLoop::new();
        let executor = Executor::asynchronous(main_loop.handle()).unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let finished = Arc::new(AtomicBool::new(false));

        let progress_events = events.clone();
        let post_events = events.clone();
        let finished_clone = finished.clone();
        executor
            .task::<usize, usize, usize>()
            .do_in_background(|count, publisher: &ProgressPublisher<usize>| {
                for i in 1..=count {
                    publisher.publish(i);
                }
                count
            })
            .on_progress_update(move |i| progress_events.lock().push(i))
            .on_post_execute(move |total| {
                post_events.lock().push(total * 1000);
                finished_clone.store(true, Ordering::SeqCst);
            })
            .execute(100)
            .unwrap();

        assert!(main_loop.run_until(|| finished.load(Ordering::SeqCst), Duration::from_secs(5)));

        let events = events.lock();
        let mut expected: Vec<usize> = (1..=100).collect();
        expected.push(100_000);
        assert_eq!(*events, expected);
    }

    #[test]
    fn test_asynchronous_tasks_share_one_worker_in_order() {
        let main_loop = MainLoop::new();
        let executor = Executor::asynchronous(main_loop.handle()).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let threads = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order_clone = order.clone();
            let threads_clone = threads.clone();
            executor
                .task::<usize, (), usize>()
                .do_in_background(move |n, _| {
                    threads_clone.lock().push(std::thread::current().id());
                    n
                })
                .on_post_execute(move |n| order_clone.lock().push(n))
                .execute(i)
                .unwrap();
        }

        assert!(main_loop.run_until(|| order.lock().len() == 5, Duration::from_secs(5)));
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);

        let threads = threads.lock();
        assert!(threads.iter().all(|t| *t == threads[0]));
    }

    #[test]
    fn test_asynchronous_panic_without_handler_surfaces_on_loop() {
        let main_loop = MainLoop::new();
        let executor = Executor::asynchronous(main_loop.handle()).unwrap();

        let task = executor
            .task::<(), (), ()>()
            .do_in_background(|(), _| panic!("unhandled"))
            .execute(())
            .unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            main_loop.run_until(|| false, Duration::from_secs(2))
        }));
        assert!(outcome.is_err());
        assert_eq!(task.state(), TaskState::Failed);
    }
}
