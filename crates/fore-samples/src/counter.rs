//! A counter that can count slowly in the background.

use std::sync::Arc;
use std::time::Duration;

use fore_core::{Delay, Executor, Observable, ObservableImp, Observer, ProgressPublisher};
use parking_lot::Mutex;

const TARGET: &str = "fore_samples::counter";

/// How many steps `increase_by_20` takes.
pub const SLOW_STEPS: u32 = 20;

#[derive(Debug, Default)]
struct CounterState {
    count: u32,
    busy: bool,
    progress: u32,
}

struct CounterInner {
    state: Mutex<CounterState>,
    observable: ObservableImp,
    executor: Executor,
    delay: Arc<dyn Delay>,
    step: Duration,
}

/// A count plus a slow increase that reports progress.
///
/// Cloning gives another handle to the same counter.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("state", &*self.inner.state.lock())
            .field("step", &self.inner.step)
            .finish()
    }
}

impl Counter {
    /// `step` is how long each of the slow steps pauses for.
    pub fn new(executor: Executor, delay: Arc<dyn Delay>, step: Duration) -> Self {
        Self {
            inner: Arc::new(CounterInner {
                state: Mutex::new(CounterState::default()),
                observable: ObservableImp::new(),
                executor,
                delay,
                step,
            }),
        }
    }

    /// Current count.
    pub fn count(&self) -> u32 {
        self.inner.state.lock().count
    }

    /// Whether a slow increase is running.
    pub fn is_busy(&self) -> bool {
        self.inner.state.lock().busy
    }

    /// Last progress value published by a running slow increase, 0 when idle.
    pub fn progress(&self) -> u32 {
        self.inner.state.lock().progress
    }

    /// Add one straight away. Ignored while a slow increase is running.
    pub fn increase_by_1(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.busy {
                tracing::debug!(target: TARGET, "increase_by_1 ignored while busy");
                return;
            }
            state.count += 1;
        }
        self.notify_observers();
    }

    /// Add twenty, one slow step at a time, reporting progress per step.
    ///
    /// Ignored while already busy. In synchronous mode the count is final
    /// when this returns.
    pub fn increase_by_20(&self) -> fore_core::Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.busy {
                tracing::debug!(target: TARGET, "increase_by_20 ignored while busy");
                return Ok(());
            }
            state.busy = true;
            state.progress = 0;
        }
        tracing::debug!(target: TARGET, "slow increase started");
        self.notify_observers();

        let delay = self.inner.delay.clone();
        let progress_counter = self.clone();
        let post_counter = self.clone();
        let failure_counter = self.clone();

        let launched = self
            .inner
            .executor
            .task::<Duration, u32, u32>()
            .do_in_background(move |step, publisher: &ProgressPublisher<u32>| {
                for i in 1..=SLOW_STEPS {
                    delay.pause(step);
                    publisher.publish(i);
                }
                SLOW_STEPS
            })
            .on_progress_update(move |progress| {
                progress_counter.inner.state.lock().progress = progress;
                progress_counter.notify_observers();
            })
            .on_post_execute(move |added| {
                {
                    let mut state = post_counter.inner.state.lock();
                    state.count += added;
                    state.busy = false;
                    state.progress = 0;
                }
                tracing::debug!(target: TARGET, added, "slow increase finished");
                post_counter.notify_observers();
            })
            .on_failure(move |err| {
                tracing::error!(target: TARGET, %err, "slow increase failed");
                failure_counter.finish_without_change();
            })
            .execute(self.inner.step);

        if let Err(err) = launched {
            self.finish_without_change();
            return Err(err);
        }
        Ok(())
    }

    fn finish_without_change(&self) {
        {
            let mut state = self.inner.state.lock();
            state.busy = false;
            state.progress = 0;
        }
        self.notify_observers();
    }
}

impl Observable for Counter {
    fn add_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.add_observer(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.remove_observer(observer);
    }

    fn notify_observers(&self) {
        self.inner.observable.notify_observers();
    }

    fn has_observers(&self) -> bool {
        self.inner.observable.has_observers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fore_core::{NoDelay, RecordingDelay};

    #[test]
    fn test_increase_by_1() {
        let counter = Counter::new(Executor::synchronous(), Arc::new(NoDelay), Duration::ZERO);
        counter.increase_by_1();
        counter.increase_by_1();
        assert_eq!(counter.count(), 2);
        assert!(!counter.is_busy());
    }

    #[test]
    fn test_increase_by_20_pauses_each_step() {
        let delay = Arc::new(RecordingDelay::new());
        let counter = Counter::new(
            Executor::synchronous(),
            delay.clone(),
            Duration::from_millis(100),
        );

        counter.increase_by_20().unwrap();

        assert_eq!(counter.count(), 20);
        assert_eq!(counter.progress(), 0);
        assert_eq!(delay.pauses().len(), 20);
        assert_eq!(delay.total(), Duration::from_secs(2));
    }

    #[test]
    fn test_notifies_on_increase_by_1() {
        let counter = Counter::new(Executor::synchronous(), Arc::new(NoDelay), Duration::ZERO);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let watched = counter.clone();
        let observer: Arc<dyn Observer> = Arc::new(move || seen_clone.lock().push(watched.count()));
        counter.add_observer(&observer);

        counter.increase_by_1();
        assert_eq!(*seen.lock(), vec![1]);
    }
}
