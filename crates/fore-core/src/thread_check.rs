//! Thread affinity checks.
//!
//! The [`MainLoop`](crate::MainLoop) records the thread that created it and
//! refuses (in debug builds) to be driven from anywhere else, since every
//! callback it runs assumes it is on the UI thread.
//!
//! ```
//! use fore_core::thread_check::ThreadAffinity;
//!
//! let affinity = ThreadAffinity::current();
//! assert!(affinity.is_same_thread());
//! affinity.debug_assert_same_thread();
//! ```

use std::thread::ThreadId;

/// Records the thread something was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the current thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The thread ID this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the current thread is the bound thread.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Panics if called from a different thread. Active in all builds.
    pub fn assert_same_thread_with_msg(&self, msg: &str) {
        if !self.is_same_thread() {
            self.panic_wrong_thread(msg);
        }
    }

    /// Debug-only version of [`assert_same_thread_with_msg`](Self::assert_same_thread_with_msg).
    #[inline]
    pub fn debug_assert_same_thread_with_msg(&self, msg: &str) {
        #[cfg(debug_assertions)]
        self.assert_same_thread_with_msg(msg);
        #[cfg(not(debug_assertions))]
        let _ = msg;
    }

    /// Debug-only assertion with a generic message.
    #[inline]
    pub fn debug_assert_same_thread(&self) {
        self.debug_assert_same_thread_with_msg("accessed from the wrong thread");
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, msg: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();
        panic!(
            "\n\
            THREAD AFFINITY VIOLATION: {msg}\n\
            Bound to thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            Post the operation through a MainHandle instead of calling it directly.",
            self.thread_id
        )
    }
}
