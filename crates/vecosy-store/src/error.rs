use vecosy_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The path does not exist in the snapshot the reference points at.
    #[error("file {path} not found at {reference}")]
    FileNotFound { reference: String, path: String },

    /// The snapshot a reference points at is missing from the store.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// A fetch was requested on a store that was opened, not cloned.
    #[error("store has no remote to fetch from")]
    NoRemote,

    /// The upstream could not be reached.
    #[error("remote {remote} unavailable: {reason}")]
    RemoteUnavailable { remote: String, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
