//! The UI-thread queue that asynchronous callbacks are marshalled onto.
//!
//! A [`MainLoop`] belongs to the thread that created it (the "UI thread").
//! Other threads hold a [`MainHandle`] and post [`QueuedInvocation`]s to it.
//! Invocations run, in posting order, whenever the owning thread drives the
//! loop with [`process_pending`](MainLoop::process_pending),
//! [`run_until`](MainLoop::run_until) or [`run`](MainLoop::run).
//!
//! # How It Works
//!
//! 1. A worker thread wraps a callback and its arguments in a closure.
//! 2. The closure is sent down a FIFO channel through a `MainHandle`.
//! 3. The owning thread pops and executes closures in order.
//!
//! Because the channel is FIFO, two invocations posted from the same thread
//! always run in the order they were posted. The task executor relies on this
//! to deliver progress updates in publication order, and post-execute after
//! the last progress update.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use fore_core::MainLoop;
//!
//! let main_loop = MainLoop::new();
//! let handle = main_loop.handle();
//! let done = Arc::new(AtomicBool::new(false));
//!
//! let done_clone = done.clone();
//! std::thread::spawn(move || {
//!     handle
//!         .post(move || done_clone.store(true, Ordering::SeqCst))
//!         .unwrap();
//! });
//!
//! assert!(main_loop.run_until(|| done.load(Ordering::SeqCst), Duration::from_secs(5)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::error::{ForeError, Result};
use crate::thread_check::ThreadAffinity;

const TARGET: &str = crate::logging::targets::MAIN_LOOP;

/// Longest single wait inside [`MainLoop::run_until`] before the condition is
/// re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A type-erased callback waiting to run on the main loop.
pub struct QueuedInvocation {
    invoke: Box<dyn FnOnce() + Send>,
}

impl QueuedInvocation {
    /// Wrap a closure for deferred execution.
    pub fn new<F>(invoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
        }
    }

    /// Run the invocation.
    pub fn execute(self) {
        (self.invoke)();
    }
}

enum LoopMessage {
    Invoke(QueuedInvocation),
    Quit,
}

/// Cross-thread handle for posting work to a [`MainLoop`].
#[derive(Clone)]
pub struct MainHandle {
    sender: Sender<LoopMessage>,
    affinity: ThreadAffinity,
    alive: Arc<AtomicBool>,
}

impl std::fmt::Debug for MainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainHandle")
            .field("thread", &self.affinity.thread_id())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl MainHandle {
    /// Queue a closure to run on the main loop's thread.
    ///
    /// Fails with [`ForeError::MainLoopClosed`] once the loop has been dropped.
    pub fn post<F>(&self, invoke: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_invocation(QueuedInvocation::new(invoke))
    }

    /// Queue an already-wrapped invocation.
    pub fn post_invocation(&self, invocation: QueuedInvocation) -> Result<()> {
        if !self.is_alive() {
            tracing::warn!(target: TARGET, "dropping invocation posted to a closed main loop");
            return Err(ForeError::MainLoopClosed);
        }
        self.sender
            .send(LoopMessage::Invoke(invocation))
            .map_err(|_| ForeError::MainLoopClosed)
    }

    /// Ask the loop to return from [`MainLoop::run`].
    pub fn quit(&self) {
        let _ = self.sender.send(LoopMessage::Quit);
    }

    /// Whether the current thread is the main loop's thread.
    pub fn is_loop_thread(&self) -> bool {
        self.affinity.is_same_thread()
    }

    /// Whether the main loop still exists.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// The UI-thread side of the queue.
///
/// Create it on the thread that should run callbacks and keep it there.
pub struct MainLoop {
    sender: Sender<LoopMessage>,
    receiver: Receiver<LoopMessage>,
    affinity: ThreadAffinity,
    alive: Arc<AtomicBool>,
    quit_requested: AtomicBool,
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop {
    /// Create a loop owned by the current thread.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            affinity: ThreadAffinity::current(),
            alive: Arc::new(AtomicBool::new(true)),
            quit_requested: AtomicBool::new(false),
        }
    }

    /// A handle other threads can post through.
    pub fn handle(&self) -> MainHandle {
        MainHandle {
            sender: self.sender.clone(),
            affinity: self.affinity,
            alive: self.alive.clone(),
        }
    }

    /// Number of queued messages.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Whether anything is queued.
    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Run everything queued at the time of the call.
    ///
    /// Invocations posted while processing wait for the next call. Returns the
    /// number of invocations executed.
    pub fn process_pending(&self) -> usize {
        self.affinity
            .debug_assert_same_thread_with_msg("MainLoop driven from a thread other than its owner");
        let queued = self.receiver.len();
        let mut executed = 0;
        for _ in 0..queued {
            match self.receiver.try_recv() {
                Ok(message) => {
                    if self.dispatch(message) {
                        executed += 1;
                    }
                }
                Err(_) => break,
            }
        }
        if executed > 0 {
            tracing::trace!(target: TARGET, executed, "processed pending invocations");
        }
        executed
    }

    /// Drive the loop until `condition` returns `true` or `timeout` elapses.
    ///
    /// Returns `true` if the condition was met.
    pub fn run_until<F>(&self, mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_pending();
            if condition() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(target: TARGET, ?timeout, "run_until timed out");
                return false;
            }
            let wait = (deadline - now).min(POLL_INTERVAL);
            match self.receiver.recv_timeout(wait) {
                Ok(message) => {
                    self.dispatch(message);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return condition(),
            }
        }
    }

    /// Drive the loop until [`MainHandle::quit`] is called.
    pub fn run(&self) {
        self.affinity
            .debug_assert_same_thread_with_msg("MainLoop driven from a thread other than its owner");
        self.quit_requested.store(false, Ordering::Release);
        tracing::debug!(target: TARGET, "main loop running");
        while !self.quit_requested.load(Ordering::Acquire) {
            match self.receiver.recv() {
                Ok(message) => {
                    self.dispatch(message);
                }
                Err(_) => break,
            }
        }
        tracing::debug!(target: TARGET, "main loop quit");
    }

    /// Execute one message. Returns `true` if it was an invocation.
    fn dispatch(&self, message: LoopMessage) -> bool {
        match message {
            LoopMessage::Invoke(invocation) => {
                invocation.execute();
                true
            }
            LoopMessage::Quit => {
                self.quit_requested.store(true, Ordering::Release);
                false
            }
        }
    }
}

impl Drop for MainLoop {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        let dropped = self.receiver.len();
        if dropped > 0 {
            tracing::warn!(target: TARGET, dropped, "main loop dropped with pending invocations");
        }
    }
}
