//! Salted, truncated hashes for identifiers that must not appear in logs.

use sha2::{Digest, Sha256};

const EMAIL_HASH_SALT: &[u8] = b"hearth-account-email-salt";

/// Hex prefix of `sha256(salt || value)`, eight bytes long.
pub fn redact_with_salt(salt: &[u8], value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Loggable stand-in for an email address.
pub fn redact_email(email: &str) -> String {
    format!("email_hash={}", redact_with_salt(EMAIL_HASH_SALT, email))
}
