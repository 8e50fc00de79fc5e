//! AES-256-GCM codec for third-party credentials stored at rest.
//!
//! Tokens have the shape `base64(nonce).base64(ciphertext).base64(tag)` using
//! the standard alphabet with padding. The key is the SHA-256 digest of the
//! configured secret, so any non-empty secret string is accepted.
//!
//! ```rust
//! use hearth_common::crypto::SecretCodec;
//!
//! let codec = SecretCodec::new(Some("correct horse battery staple"));
//! let token = codec.encrypt("ya29.access-token")?;
//! assert_eq!(token.split('.').count(), 3);
//! assert_eq!(codec.decrypt(&token)?, "ya29.access-token");
//! # Ok::<(), hearth_common::crypto::CodecError>(())
//! ```

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SEGMENT_SEPARATOR: char = '.';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("token encryption key is not configured")]
    ConfigurationMissing,

    #[error("invalid encrypted payload: {0}")]
    InvalidPayload(String),

    #[error("encrypted payload failed authentication")]
    AuthenticationFailure,
}

/// Symmetric codec; `None` cipher means no secret was configured.
#[derive(Clone)]
pub struct SecretCodec {
    cipher: Option<Aes256Gcm>,
}

impl std::fmt::Debug for SecretCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCodec").field("configured", &self.cipher.is_some()).finish()
    }
}

impl SecretCodec {
    /// Build a codec from the configured secret. Empty secrets count as
    /// missing.
    pub fn new(secret: Option<&str>) -> Self {
        let cipher = secret.filter(|s| !s.is_empty()).map(|s| {
            let key = Sha256::digest(s.as_bytes());
            Aes256Gcm::new(&key)
        });
        Self { cipher }
    }

    pub fn is_configured(&self) -> bool {
        self.cipher.is_some()
    }

    /// Encrypt with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|_| CodecError::InvalidPayload("encryption failed".to_string()))?;

        Ok(format!(
            "{}{sep}{}{sep}{}",
            BASE64.encode(nonce_bytes),
            BASE64.encode(&buffer),
            BASE64.encode(tag),
            sep = SEGMENT_SEPARATOR
        ))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, CodecError> {
        let cipher = self.cipher()?;

        let segments: Vec<&str> = token.split(SEGMENT_SEPARATOR).collect();
        let [nonce_b64, ct_b64, tag_b64] = segments.as_slice() else {
            return Err(CodecError::InvalidPayload(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };
        if nonce_b64.is_empty() || ct_b64.is_empty() || tag_b64.is_empty() {
            return Err(CodecError::InvalidPayload("empty segment".to_string()));
        }

        let nonce_bytes: [u8; NONCE_LEN] = decode_segment(nonce_b64, "nonce")?
            .try_into()
            .map_err(|_| CodecError::InvalidPayload("nonce must be 12 bytes".to_string()))?;
        let tag_bytes: [u8; TAG_LEN] = decode_segment(tag_b64, "tag")?
            .try_into()
            .map_err(|_| CodecError::InvalidPayload("tag must be 16 bytes".to_string()))?;
        let mut buffer = decode_segment(ct_b64, "ciphertext")?;

        cipher
            .decrypt_in_place_detached(
                &Nonce::from(nonce_bytes),
                b"",
                &mut buffer,
                &Tag::from(tag_bytes),
            )
            .map_err(|_| CodecError::AuthenticationFailure)?;

        String::from_utf8(buffer)
            .map_err(|_| CodecError::InvalidPayload("plaintext is not UTF-8".to_string()))
    }

    fn cipher(&self) -> Result<&Aes256Gcm, CodecError> {
        self.cipher.as_ref().ok_or(CodecError::ConfigurationMissing)
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, CodecError> {
    BASE64
        .decode(segment)
        .map_err(|e| CodecError::InvalidPayload(format!("{name} is not valid base64: {e}")))
}
