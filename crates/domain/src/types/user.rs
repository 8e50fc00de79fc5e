//! User preference types

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

/// Per-user settings consulted by holiday and meal plan lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct UserPreferences {
    pub user_id: String,
    /// BCP 47 style tag such as `en-GB`.
    pub locale: Option<String>,
}
