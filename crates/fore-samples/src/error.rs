//! Error types for the sample models.

use fore_core::ForeError;

/// Why a fruit fetch did not produce fruit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// A fetch was already in flight.
    #[error("A fetch is already in progress")]
    Busy,

    /// The fruit service reported a failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The fetch was cancelled before it finished.
    #[error("Fetch was cancelled")]
    Cancelled,

    /// The fetch task could not be run.
    #[error("Executor error: {0}")]
    Executor(#[from] ForeError),
}

/// Todo list errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TodoError {
    /// The description was empty after trimming.
    #[error("Todo description cannot be empty")]
    EmptyDescription,

    /// No item exists at the given index.
    #[error("No todo item at index {0}")]
    NoSuchItem(usize),
}
