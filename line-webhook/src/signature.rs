//! HMAC-SHA256 signature validation for LINE webhooks.
//!
//! LINE signs the raw request body with the channel secret and sends the
//! base64-encoded digest in the `X-Line-Signature` header.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),
    #[error("signature mismatch")]
    Mismatch,
}

#[derive(Clone)]
pub struct SignatureValidator {
    channel_secret: String,
}

impl SignatureValidator {
    pub fn new(channel_secret: String) -> Self {
        Self { channel_secret }
    }

    /// Verify `signature_header` against the raw body. The digest comparison
    /// is constant-time.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError> {
        let signature_header = signature_header.trim();
        if signature_header.is_empty() {
            return Err(SignatureError::Missing);
        }

        let expected = STANDARD
            .decode(signature_header)
            .map_err(|e| SignatureError::InvalidFormat(format!("invalid base64: {e}")))?;

        let mut mac = HmacSha256::new_from_slice(self.channel_secret.as_bytes())
            .map_err(|e| SignatureError::InvalidFormat(e.to_string()))?;
        mac.update(payload);

        mac.verify_slice(&expected).map_err(|_| {
            tracing::warn!("webhook signature verification failed");
            SignatureError::Mismatch
        })
    }
}
