//! Error types for fore.

/// The main error type for fore operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForeError {
    /// An observer reference was dangling when it was registered.
    #[error("Observer reference is null or has already been dropped")]
    NullObserver,

    /// `execute` was called on a task that has already run.
    #[error("Task has already been executed; tasks are single-use")]
    AlreadyExecuted,

    /// A task builder was executed without background work configured.
    #[error("Task builder has no do_in_background work configured")]
    MissingBackgroundWork,

    /// An asynchronous executor was built without a main loop handle.
    #[error("Asynchronous work mode requires a main loop handle")]
    MissingDispatcher,

    /// The worker thread has been stopped and no longer accepts work.
    #[error("Worker has been stopped")]
    WorkerStopped,

    /// The worker's task queue is full.
    #[error("Worker queue is full")]
    WorkerQueueFull,

    /// The worker thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),

    /// The main loop has been dropped and no longer accepts invocations.
    #[error("Main loop has been closed")]
    MainLoopClosed,

    /// Background work panicked.
    #[error("Background work panicked: {0}")]
    WorkPanicked(String),

    /// A work mode string could not be parsed.
    #[error("Invalid work mode '{0}', expected 'sync' or 'async'")]
    InvalidWorkMode(String),

    /// Object graph error.
    #[error("Object graph error: {0}")]
    ObjectGraph(#[from] ObjectGraphError),
}

/// Object graph (composition root) errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectGraphError {
    /// `setup` has already run for this graph.
    #[error("Object graph has already been initialized")]
    AlreadyInitialized,

    /// `get` was called before `setup`.
    #[error("Object graph has not been initialized. Call ObjectGraph::setup() first")]
    NotInitialized,

    /// No instance is registered for the requested type.
    #[error("No instance registered for type {0}")]
    NotRegistered(&'static str),
}

/// A specialized Result type for fore operations.
pub type Result<T> = std::result::Result<T, ForeError>;
