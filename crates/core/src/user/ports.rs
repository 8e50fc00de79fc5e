//! Port interfaces for user lookups
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations for user data.

use async_trait::async_trait;
use hearth_domain::{Result, UserPreferences};

/// Read access to users and their preferences
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every known user id, oldest first
    async fn list_user_ids(&self) -> Result<Vec<String>>;

    async fn find_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>>;

    /// Create an empty preferences row if none exists, then return it
    async fn ensure_preferences(&self, user_id: &str) -> Result<UserPreferences>;
}
