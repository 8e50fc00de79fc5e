//! Credential encryption backed by the shared AES-256-GCM codec.

use hearth_common::crypto::SecretCodec;
use hearth_core::calendar::ports::SecretCipher;
use hearth_domain::{Result, SecurityConfig};

use crate::errors::InfraError;

/// [`SecretCipher`] over [`SecretCodec`]. An unconfigured key is accepted at
/// construction and reported as `ConfigurationMissing` on use.
#[derive(Debug, Clone)]
pub struct AesSecretCipher {
    codec: SecretCodec,
}

impl AesSecretCipher {
    pub fn new(secret: Option<&str>) -> Self {
        Self { codec: SecretCodec::new(secret) }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.token_encryption_key.as_deref())
    }

    pub fn is_configured(&self) -> bool {
        self.codec.is_configured()
    }
}

impl SecretCipher for AesSecretCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.codec.encrypt(plaintext).map_err(|e| InfraError::from(e).into())
    }

    fn decrypt(&self, token: &str) -> Result<String> {
        self.codec.decrypt(token).map_err(|e| InfraError::from(e).into())
    }
}
