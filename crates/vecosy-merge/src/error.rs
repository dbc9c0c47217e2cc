use vecosy_catalog::ResolveError;

/// Errors from configuration merging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// The application version itself could not be resolved; the merge is
    /// aborted.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A candidate file exists but is not a valid document.
    #[error("cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },

    /// The merged document cannot be rendered in the requested format.
    #[error("cannot render document as {format}: {reason}")]
    Render { format: String, reason: String },

    /// The file extension is not one of `yml`, `yaml`, `json`, `toml`.
    #[error("unsupported document format: {0:?}")]
    UnsupportedFormat(String),

    /// A Spring-style file name is missing its application part.
    #[error("invalid file name {0:?}: expected <application>[-<profile>].<extension>")]
    InvalidFileName(String),
}

/// Result alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
