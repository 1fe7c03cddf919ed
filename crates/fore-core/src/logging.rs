//! Logging facilities for fore.
//!
//! fore uses the `tracing` crate for instrumentation. Nothing is printed unless
//! the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("fore_core=debug,fore_samples=debug")
//!     .init();
//! ```
//!
//! Every module logs under its own target (see [`targets`]) so individual
//! subsystems can be filtered.

/// Target names for log filtering.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "fore_core";
    /// Observer/observable target.
    pub const OBSERVABLE: &str = "fore_core::observable";
    /// Task executor target.
    pub const TASK: &str = "fore_core::task";
    /// Worker thread target.
    pub const WORKER: &str = "fore_core::worker";
    /// Main loop target.
    pub const MAIN_LOOP: &str = "fore_core::main_loop";
    /// Object graph target.
    pub const OBJECT_GRAPH: &str = "fore_core::object_graph";
}

/// A guard that keeps a timing span entered until dropped.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: "fore::perf", "perf", operation);
        Self {
            span: span.entered(),
        }
    }
}

#[macro_export]
macro_rules! fore_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}
