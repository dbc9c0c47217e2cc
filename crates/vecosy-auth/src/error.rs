use vecosy_catalog::ResolveError;

/// Errors from request authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Security is enabled and the request carried no token.
    #[error("no credentials supplied")]
    NoCredentialsSupplied,

    /// The token could not be parsed or its signature did not verify.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The application's public key could not be read.
    #[error("public key unavailable: {0}")]
    KeyUnavailable(#[from] ResolveError),

    /// The application's public key file is not a valid key.
    #[error("invalid public key for {app}: {reason}")]
    InvalidPublicKey { app: String, reason: String },
}

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
