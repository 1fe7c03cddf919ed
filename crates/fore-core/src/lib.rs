//! Core systems for fore.
//!
//! This crate provides the reactive model layer that fore applications are
//! built on:
//!
//! - **Observer / Observable**: "something changed" notification with weak,
//!   identity-keyed registration and reentrancy-safe notify
//! - **Work modes**: one switch that decides whether tasks run inline or on a
//!   worker thread, so the same model code is deterministic under test
//! - **Task executor**: single-use pre / work / progress / post tasks built
//!   with a fluent [`TaskBuilder`]
//! - **Main loop**: the UI-thread queue asynchronous callbacks are delivered to
//! - **View helpers**: [`SyncTrigger`] and [`LifecycleSyncer`]
//! - **Object graph**: a small type-keyed registry for the composition root
//!
//! # Observer Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use fore_core::{Observable, ObservableImp, Observer};
//!
//! let model = ObservableImp::new();
//! let syncs = Arc::new(AtomicUsize::new(0));
//!
//! let syncs_clone = syncs.clone();
//! let observer: Arc<dyn Observer> = Arc::new(move || {
//!     syncs_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! model.add_observer(&observer);
//! model.notify_observers();
//! model.remove_observer(&observer);
//! model.notify_observers();
//!
//! assert_eq!(syncs.load(Ordering::SeqCst), 1);
//! ```
//!
//! # Asynchronous Task Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//! use fore_core::{Executor, MainLoop};
//!
//! let main_loop = MainLoop::new();
//! let executor = Executor::asynchronous(main_loop.handle()).unwrap();
//! let done = Arc::new(AtomicBool::new(false));
//!
//! let done_clone = done.clone();
//! executor
//!     .task::<(), (), u64>()
//!     .do_in_background(|(), _| (1..=10).sum())
//!     .on_post_execute(move |sum| {
//!         assert_eq!(sum, 55);
//!         done_clone.store(true, Ordering::SeqCst);
//!     })
//!     .execute(())
//!     .unwrap();
//!
//! // Callbacks run here, on the thread driving the loop.
//! assert!(main_loop.run_until(|| done.load(Ordering::SeqCst), Duration::from_secs(5)));
//! ```

mod builder;
mod cancel;
mod delay;
mod error;
mod executor;
mod group;
mod lifecycle;
pub mod logging;
pub mod main_loop;
mod object_graph;
pub mod observer;
mod task;
pub mod thread_check;
mod trigger;
mod work_mode;
pub mod worker;

pub use builder::TaskBuilder;
pub use cancel::CancellationToken;
pub use delay::{Delay, NoDelay, RecordingDelay, ThreadDelay};
pub use error::{ForeError, ObjectGraphError, Result};
pub use executor::{Executor, ExecutorBuilder};
pub use group::ObservableGroup;
pub use lifecycle::{LifecycleSyncer, SyncableView};
pub use logging::PerfSpan;
pub use main_loop::{MainHandle, MainLoop, QueuedInvocation};
pub use object_graph::ObjectGraph;
pub use observer::{Observable, ObservableImp, Observer, ObserverGuard, ObserverId};
pub use task::{ProgressPublisher, Task, TaskId, TaskState};
pub use thread_check::ThreadAffinity;
pub use trigger::{ResetRule, SyncTrigger};
pub use work_mode::{WORK_MODE_ENV, WorkMode};
pub use worker::{Worker, WorkerBuilder, WorkerConfig};
