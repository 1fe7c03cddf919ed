//! Execution mode selection.
//!
//! Every component that runs work is handed a [`WorkMode`] when it is built
//! and keeps it for its whole lifetime:
//!
//! - [`WorkMode::Synchronous`]: everything runs inline on the calling thread.
//!   Calls block until all phases are done, which makes tests deterministic.
//! - [`WorkMode::Asynchronous`]: work runs on a worker thread and callbacks are
//!   marshalled back to the thread driving the [`MainLoop`](crate::MainLoop).

use std::fmt;
use std::str::FromStr;

use crate::error::{ForeError, Result};

/// Environment variable read by [`WorkMode::from_env`].
pub const WORK_MODE_ENV: &str = "FORE_WORK_MODE";

/// Selects synchronous or asynchronous execution semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkMode {
    /// Run every phase inline on the calling thread.
    Synchronous,
    /// Run work on a worker thread, deliver callbacks on the main loop.
    #[default]
    Asynchronous,
}

impl WorkMode {
    /// Returns `true` for [`WorkMode::Synchronous`].
    #[inline]
    pub fn is_synchronous(self) -> bool {
        self == Self::Synchronous
    }

    /// Read the work mode from `FORE_WORK_MODE`.
    ///
    /// Returns `Ok(None)` if the variable is unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(WORK_MODE_ENV) {
            Ok(value) => value.parse().map(Some),
            Err(_) => Ok(None),
        }
    }
}

impl FromStr for WorkMode {
    type Err = ForeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(Self::Synchronous),
            "async" | "asynchronous" => Ok(Self::Asynchronous),
            _ => Err(ForeError::InvalidWorkMode(s.to_string())),
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synchronous => write!(f, "synchronous"),
            Self::Asynchronous => write!(f, "asynchronous"),
        }
    }
}
