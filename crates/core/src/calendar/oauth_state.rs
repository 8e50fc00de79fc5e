//! OAuth `state` parameter carried through the Google consent redirect

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hearth_domain::{HearthError, Result};
use serde::{Deserialize, Serialize};

/// Decoded state: who started the flow and where Google sends them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthState {
    pub user_id: String,
    pub redirect_uri: String,
}

impl OAuthState {
    pub fn new(user_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), redirect_uri: redirect_uri.into() }
    }

    /// base64url (no padding) of `{"userId","redirectUri"}`
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| HearthError::Internal(format!("failed to encode OAuth state: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(state: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(state.trim_end_matches('='))
            .map_err(|_| HearthError::Validation("OAuth state is not valid base64url".into()))?;
        let decoded: Self = serde_json::from_slice(&bytes)
            .map_err(|_| HearthError::Validation("OAuth state is not valid JSON".into()))?;
        if decoded.user_id.is_empty() {
            return Err(HearthError::Validation("OAuth state has no userId".into()));
        }
        Ok(decoded)
    }
}
