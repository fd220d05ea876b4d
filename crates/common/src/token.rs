//! Tamper-evident transaction tokens
//!
//! A token is `base64(payload || "/" || hex(hmac_sha256(secret, payload)))`.
//! The server keeps no state for open transactions; everything it needs is
//! in the payload, and the MAC proves it issued the token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::path::ContentPath;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("token failed verification")]
    Unverified,
    #[error("token payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified(Vec<u8>),
    Unverified,
}

/// Signs and verifies opaque tokens with a process-wide secret.
#[derive(Clone)]
pub struct TransactionCodec {
    mac: HmacSha256,
}

impl std::fmt::Debug for TransactionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransactionCodec { secret: <redacted> }")
    }
}

impl TransactionCodec {
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    fn digest(&self, payload: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn sign(&self, payload: &[u8]) -> String {
        let digest = self.digest(payload);
        let mut token = Vec::with_capacity(payload.len() + 1 + digest.len());
        token.extend_from_slice(payload);
        token.push(b'/');
        token.extend_from_slice(digest.as_bytes());
        STANDARD.encode(token)
    }

    /// Never fails loudly: anything that is not a token we signed is
    /// [`Verification::Unverified`].
    pub fn verify(&self, token: &str) -> Verification {
        let Ok(decoded) = STANDARD.decode(token.trim()) else {
            return Verification::Unverified;
        };
        let Some(split) = decoded.iter().rposition(|b| *b == b'/') else {
            return Verification::Unverified;
        };
        let (payload, signature) = (&decoded[..split], &decoded[split + 1..]);

        let expected = self.digest(payload);
        if expected.len() != signature.len() {
            return Verification::Unverified;
        }
        if bool::from(expected.as_bytes().ct_eq(signature)) {
            Verification::Verified(payload.to_vec())
        } else {
            Verification::Unverified
        }
    }
}

/// State of an open child creation, carried inside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransaction {
    /// Directory of the new node, relative to the content root.
    pub path: String,
    pub content_path: ContentPath,
}

pub fn encode_transaction(
    codec: &TransactionCodec,
    transaction: &CreateTransaction,
) -> Result<String, TokenError> {
    let payload = serde_json::to_vec(transaction)?;
    Ok(codec.sign(&payload))
}

pub fn decode_transaction(
    codec: &TransactionCodec,
    token: &str,
) -> Result<CreateTransaction, TokenError> {
    match codec.verify(token) {
        Verification::Verified(payload) => Ok(serde_json::from_slice(&payload)?),
        Verification::Unverified => Err(TokenError::Unverified),
    }
}
