//! Cryptographic primitives for Vecosy.
//!
//! Provides Ed25519 signing/verification and the compact signed token
//! format clients present to prove they own an application's key pair.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod signer;
pub mod token;

pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
pub use token::{sign_token, Token, TokenError, TokenHeader, TOKEN_ALGORITHM};
