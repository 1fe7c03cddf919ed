//! Injectable delays.
//!
//! Models that simulate slow work (a counter that ticks every 100ms, a fake
//! network call) take a `Arc<dyn Delay>` instead of sleeping directly, so
//! tests can swap in [`NoDelay`] or [`RecordingDelay`] and stay fast.

use std::time::Duration;

use parking_lot::Mutex;

/// Something that can pause the current thread.
pub trait Delay: Send + Sync {
    /// Pause for `duration`.
    fn pause(&self, duration: Duration);
}

/// Real delay backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Delay that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn pause(&self, _duration: Duration) {}
}

/// Test double that records each requested pause and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pause requested so far, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }

    /// Sum of all requested pauses.
    pub fn total(&self) -> Duration {
        self.pauses.lock().iter().sum()
    }
}

impl Delay for RecordingDelay {
    fn pause(&self, duration: Duration) {
        self.pauses.lock().push(duration);
    }
}
