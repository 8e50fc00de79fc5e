#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hearth_core::{CalendarProviderAdapter, GeneratedDay, ProviderFetch, RecipeSource};
use hearth_domain::{CalendarAccount, CalendarProvider, MealItem, NormalizedEvent, Result};
use hearth_infra::database::{DbManager, SqliteUserRepository};
use hearth_infra::AesSecretCipher;
use tempfile::TempDir;

pub const TEST_ENCRYPTION_KEY: &str = "integration-test-encryption-key";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with migrations applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("hearth-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository::new(self.manager.clone())
    }

    pub async fn seed_user(&self, user_id: &str) {
        self.users().create_user(user_id, Some(&format!("{user_id}@example.com"))).await.unwrap();
    }
}

pub fn cipher() -> Arc<AesSecretCipher> {
    Arc::new(AesSecretCipher::new(Some(TEST_ENCRYPTION_KEY)))
}

/// Provider adapter that replays a queue of canned fetches.
pub struct ScriptedAdapter {
    provider: CalendarProvider,
    fetches: Mutex<Vec<ProviderFetch>>,
}

impl ScriptedAdapter {
    pub fn new(provider: CalendarProvider, mut fetches: Vec<ProviderFetch>) -> Self {
        fetches.reverse();
        Self { provider, fetches: Mutex::new(fetches) }
    }
}

#[async_trait]
impl CalendarProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> CalendarProvider {
        self.provider
    }

    async fn fetch_events(&self, _account: &CalendarAccount) -> ProviderFetch {
        self.fetches.lock().unwrap().pop().unwrap_or_else(|| ProviderFetch::ok(Vec::new()))
    }
}

pub fn event(external_id: &str, hour: u32) -> NormalizedEvent {
    use chrono::{TimeZone, Utc};

    let starts_at = Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap();
    NormalizedEvent {
        external_id: external_id.to_string(),
        summary: Some(format!("Event {external_id}")),
        description: None,
        location: None,
        starts_at,
        ends_at: starts_at + chrono::Duration::hours(1),
        metadata: Some(serde_json::json!({"id": external_id})),
    }
}

/// Recipe source returning three fixed meals and counting plan generations.
#[derive(Default)]
pub struct CountingRecipes {
    pub generated: AtomicUsize,
}

impl CountingRecipes {
    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }
}

pub fn meal(id: i64, title: &str) -> MealItem {
    MealItem {
        id,
        title: title.to_string(),
        ready_in_minutes: Some(20),
        servings: Some(2),
        image: None,
        source_url: None,
        summary: None,
        nutrients: None,
    }
}

#[async_trait]
impl RecipeSource for CountingRecipes {
    async fn generate_day(&self, target_calories: u32) -> Result<GeneratedDay> {
        self.generated.fetch_add(1, Ordering::SeqCst);
        let mut nutrients = BTreeMap::new();
        nutrients.insert("calories".to_string(), f64::from(target_calories) - 12.0);
        nutrients.insert("protein".to_string(), 95.0);
        Ok(GeneratedDay { meal_ids: vec![11, 12, 13], nutrients })
    }

    async fn recipe_information(&self, recipe_id: i64) -> Result<MealItem> {
        Ok(meal(recipe_id, &format!("Recipe {recipe_id}")))
    }

    async fn random_recipe(&self, _tags: &[&str]) -> Result<Option<MealItem>> {
        Ok(Some(meal(99, "Plum pudding")))
    }
}
