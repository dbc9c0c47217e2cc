use vecosy_store::StoreError;

/// Errors from synchronization and watch delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The upstream fetch failed. Scheduled fetches retry on the next tick.
    #[error("fetch failed: {0}")]
    FetchFailed(StoreError),

    /// Listing references after a fetch (or on the initial load) failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A periodic fetch task is already running.
    #[error("periodic fetching already running")]
    AlreadyRunning,

    /// The fetch interval must be non-zero.
    #[error("fetch interval must be greater than zero")]
    InvalidInterval,

    /// No tokio runtime is available to spawn the periodic task on.
    #[error("no async runtime available: {0}")]
    NoRuntime(String),

    /// The watch stream consumer went away.
    #[error("watch sink closed")]
    SinkClosed,
}

/// Result alias for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
