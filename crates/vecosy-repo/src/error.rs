use thiserror::Error;
use vecosy_auth::AuthError;
use vecosy_catalog::ResolveError;
use vecosy_merge::MergeError;
use vecosy_store::StoreError;
use vecosy_sync::SyncError;
use vecosy_types::ValidationError;

/// Transport-independent category of a [`RepoError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    NotFound,
    Unauthorized,
    BadRequest,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepoError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RepoError {
    /// How a transport should report this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            RepoError::Validation(_) => ErrorClass::BadRequest,
            RepoError::Resolve(e) => resolve_class(e),
            RepoError::Merge(MergeError::Resolve(e)) => resolve_class(e),
            RepoError::Merge(MergeError::UnsupportedFormat(_) | MergeError::InvalidFileName(_)) => {
                ErrorClass::BadRequest
            }
            RepoError::Merge(MergeError::Parse { .. } | MergeError::Render { .. }) => {
                ErrorClass::Internal
            }
            RepoError::Auth(_) => ErrorClass::Unauthorized,
            RepoError::Sync(SyncError::FetchFailed(_) | SyncError::Store(_)) => {
                ErrorClass::Unavailable
            }
            RepoError::Sync(SyncError::AlreadyRunning | SyncError::InvalidInterval) => {
                ErrorClass::BadRequest
            }
            RepoError::Sync(SyncError::NoRuntime(_) | SyncError::SinkClosed) => {
                ErrorClass::Internal
            }
            RepoError::Config(_) => ErrorClass::Internal,
        }
    }
}

fn resolve_class(err: &ResolveError) -> ErrorClass {
    match err {
        ResolveError::ApplicationNotFound(_)
        | ResolveError::NoMatchingVersion { .. }
        | ResolveError::FileNotFound { .. }
        | ResolveError::Store(StoreError::FileNotFound { .. }) => ErrorClass::NotFound,
        ResolveError::Store(StoreError::NoRemote | StoreError::RemoteUnavailable { .. }) => {
            ErrorClass::Unavailable
        }
        ResolveError::Store(StoreError::ObjectNotFound(_)) => ErrorClass::Internal,
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
