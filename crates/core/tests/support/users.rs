use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hearth_core::UserDirectory;
use hearth_domain::{Result as DomainResult, UserPreferences};

/// In-memory user table keyed by id, with optional locale preferences.
#[derive(Default, Clone)]
pub struct MockUserDirectory {
    users: Arc<Mutex<BTreeMap<String, Option<UserPreferences>>>>,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user without preferences.
    pub fn with_user(self, user_id: &str) -> Self {
        self.users.lock().unwrap().insert(user_id.to_string(), None);
        self
    }

    pub fn with_locale(self, user_id: &str, locale: &str) -> Self {
        self.users.lock().unwrap().insert(
            user_id.to_string(),
            Some(UserPreferences { user_id: user_id.to_string(), locale: Some(locale.to_string()) }),
        );
        self
    }

    pub fn has_preferences(&self, user_id: &str) -> bool {
        matches!(self.users.lock().unwrap().get(user_id), Some(Some(_)))
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn list_user_ids(&self) -> DomainResult<Vec<String>> {
        Ok(self.users.lock().unwrap().keys().cloned().collect())
    }

    async fn find_preferences(&self, user_id: &str) -> DomainResult<Option<UserPreferences>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned().flatten())
    }

    async fn ensure_preferences(&self, user_id: &str) -> DomainResult<UserPreferences> {
        let mut users = self.users.lock().unwrap();
        let entry = users.entry(user_id.to_string()).or_default();
        Ok(entry
            .get_or_insert_with(|| UserPreferences { user_id: user_id.to_string(), locale: None })
            .clone())
    }
}
