use thiserror::Error;

/// Errors produced while validating caller-supplied identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid application identifier {name:?}: {reason}")]
    InvalidApplicationIdentifier { name: String, reason: String },

    #[error("invalid version syntax {version:?}: {reason}")]
    InvalidVersionSyntax { version: String, reason: String },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
