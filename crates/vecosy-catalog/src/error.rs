use vecosy_store::StoreError;

/// Errors from version resolution and snapshot reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The catalog has no application with this name.
    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    /// Every catalog version of the application is newer than requested.
    #[error("no version of {application} satisfies <= {requested}")]
    NoMatchingVersion {
        application: String,
        requested: String,
    },

    /// The resolved snapshot does not contain the path.
    #[error("file {path} not found in {application}@{version}")]
    FileNotFound {
        application: String,
        version: String,
        path: String,
    },

    /// Any other object store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// `true` when the catalog does not know the application at all.
    pub fn is_application_not_found(&self) -> bool {
        matches!(self, ResolveError::ApplicationNotFound(_))
    }
}

/// Result alias for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
