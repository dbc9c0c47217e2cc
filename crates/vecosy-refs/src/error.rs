//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur while interpreting a reference name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefError {
    /// The name is not in the `refs/heads`, `refs/remotes` or `refs/tags` namespace.
    #[error("unsupported ref namespace: {name}")]
    UnsupportedNamespace { name: String },

    /// The name does not follow the `<application>/<version>` convention.
    #[error("ref {name} does not match the naming convention: {reason}")]
    ConventionMismatch { name: String, reason: String },

    /// The version component is not a semantic version.
    #[error("ref {name} has an invalid version {version:?}: {reason}")]
    InvalidVersion {
        name: String,
        version: String,
        reason: String,
    },
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
