//! Request authentication for Vecosy.
//!
//! Each application version carries its own public key as a file
//! (`pub.key`) in its snapshot. Requests present a token signed with the
//! matching private key; the [`TokenVerifier`] checks it against the key
//! loaded through the [`KeyCache`], so the store is read once per
//! application version rather than once per request.

pub mod cache;
pub mod error;
pub mod verifier;

pub use cache::{KeyCache, DEFAULT_KEY_PATH};
pub use error::{AuthError, AuthResult};
pub use verifier::{extract_token, TokenVerifier};
