//! Compact signed tokens.
//!
//! A token is `base64url(header) "." base64url(payload) "." base64url(signature)`
//! without padding, the JWS compact serialization. The header must declare
//! `"alg": "EdDSA"`; the signature covers the first two segments exactly as
//! they appear on the wire.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::signer::{Signature, SignatureError, SigningKey, VerifyingKey};

/// The only accepted signature algorithm.
pub const TOKEN_ALGORITHM: &str = "EdDSA";

/// Protected token header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// Errors from token parsing and verification.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),
}

/// A parsed, not yet verified, token.
#[derive(Clone, Debug)]
pub struct Token {
    header: TokenHeader,
    payload: Vec<u8>,
    signing_input: String,
    signature: Signature,
}

impl Token {
    /// Parse the compact serialization.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let token = token.trim();
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed("expected three segments".into()));
        };

        let header_bytes = decode_segment("header", header_b64)?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| TokenError::Malformed(format!("header: {e}")))?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let payload = decode_segment("payload", payload_b64)?;
        let signature = Signature::from_slice(&decode_segment("signature", signature_b64)?)?;

        Ok(Self {
            header,
            payload,
            signing_input: format!("{header_b64}.{payload_b64}"),
            signature,
        })
    }

    /// Verify the signature against `key`.
    pub fn verify(&self, key: &VerifyingKey) -> Result<(), TokenError> {
        key.verify(self.signing_input.as_bytes(), &self.signature)?;
        Ok(())
    }

    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// The raw payload bytes. Only meaningful after [`Token::verify`].
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Produce a compact token over `payload`.
pub fn sign_token(key: &SigningKey, payload: &[u8]) -> String {
    // A struct with two string fields always serializes.
    let header = serde_json::to_vec(&TokenHeader::default()).unwrap_or_default();
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = key.sign(signing_input.as_bytes());
    format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    )
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{name}: {e}")))
}
