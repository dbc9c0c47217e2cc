use std::sync::Arc;

use tracing::{debug, warn};
use vecosy_crypto::Token;
use vecosy_types::SemanticVersion;

use crate::cache::KeyCache;
use crate::error::{AuthError, AuthResult};

/// Pick the request token from the transport's credentials.
///
/// An `Authorization` value wins over a dedicated config-token value; a
/// `Bearer ` prefix is stripped. Blank values count as absent.
pub fn extract_token<'a>(
    authorization: Option<&'a str>,
    config_token: Option<&'a str>,
) -> Option<&'a str> {
    let from_header = authorization
        .map(str::trim)
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|value| !value.is_empty());
    from_header.or_else(|| config_token.map(str::trim).filter(|value| !value.is_empty()))
}

/// Verifies request tokens against the requested application's public key.
#[derive(Clone, Debug)]
pub struct TokenVerifier {
    security_enabled: bool,
    keys: Arc<KeyCache>,
}

impl TokenVerifier {
    pub fn new(security_enabled: bool, keys: Arc<KeyCache>) -> Self {
        Self {
            security_enabled,
            keys,
        }
    }

    pub fn security_enabled(&self) -> bool {
        self.security_enabled
    }

    pub fn key_cache(&self) -> &Arc<KeyCache> {
        &self.keys
    }

    /// Check `token` for `(app, version)`.
    ///
    /// With security disabled every request passes. Otherwise a missing
    /// token is `NoCredentialsSupplied`, and a token that does not parse or
    /// whose signature does not match the application's key is
    /// `AuthenticationFailed`.
    pub async fn verify(
        &self,
        app: &str,
        version: &SemanticVersion,
        token: Option<&str>,
    ) -> AuthResult<()> {
        if !self.security_enabled {
            return Ok(());
        }
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoCredentialsSupplied)?;

        let key = self.keys.get_or_fetch(app, version).await?;

        let parsed = Token::parse(token).map_err(|e| {
            warn!(app, version = %version, error = %e, "rejecting malformed token");
            AuthError::AuthenticationFailed(e.to_string())
        })?;
        parsed.verify(&key).map_err(|e| {
            warn!(app, version = %version, error = %e, "rejecting token");
            AuthError::AuthenticationFailed(e.to_string())
        })?;

        debug!(app, version = %version, "token verified");
        Ok(())
    }
}
