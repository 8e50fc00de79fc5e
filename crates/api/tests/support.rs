#![allow(dead_code)]

use hearth_api::{AppContext, IntegrationEndpoints};
use hearth_domain::{
    CalendarificConfig, Config, DatabaseConfig, GoogleConfig, SecurityConfig, SpoonacularConfig,
};
use hearth_infra::integrations::calendar::GoogleEndpoints;
use tempfile::TempDir;
use wiremock::MockServer;

pub const TEST_ENCRYPTION_KEY: &str = "api-test-encryption-key";
pub const REDIRECT_URI: &str = "https://hearth.example.com/oauth/google";
pub const CALENDARIFIC_PATH: &str = "/api/v2/holidays";

/// A context wired to a temporary database and one mock server standing in
/// for every third-party API.
pub struct TestApp {
    pub ctx: AppContext,
    pub server: MockServer,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_scheduler(false).await
    }

    pub async fn with_scheduler(enabled: bool) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temporary directory");
        let server = MockServer::start().await;
        let config = test_config(&temp_dir, &server, enabled);

        let endpoints = IntegrationEndpoints {
            google: Some(GoogleEndpoints::with_base(&server.uri())),
            spoonacular_base: Some(server.uri()),
            calendarific_url: Some(format!("{}{CALENDARIFIC_PATH}", server.uri())),
        };
        let ctx = AppContext::with_endpoints(config, endpoints)
            .await
            .expect("failed to build application context");

        Self { ctx, server, _temp_dir: temp_dir }
    }

    pub async fn seed_user(&self, user_id: &str, locale: Option<&str>) {
        self.ctx.users.create_user(user_id, None).await.expect("failed to seed user");
        self.ctx.users.set_locale(user_id, locale).await.expect("failed to set locale");
    }
}

pub fn test_config(temp_dir: &TempDir, server: &MockServer, scheduler_enabled: bool) -> Config {
    let mut config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("hearth.db").to_string_lossy().into_owned(),
            pool_size: 4,
        },
        security: SecurityConfig { token_encryption_key: Some(TEST_ENCRYPTION_KEY.into()) },
        google: GoogleConfig {
            client_id: Some("client-id".into()),
            client_secret: Some("client-secret".into()),
            redirect_uri: Some(REDIRECT_URI.into()),
        },
        spoonacular: SpoonacularConfig { api_key: Some("spoon-key".into()) },
        calendarific: CalendarificConfig { api_key: Some("cal-key".into()) },
        ..Config::default()
    };
    config.apple.caldav_endpoint = server.uri();
    config.scheduler.enabled = scheduler_enabled;
    config
}
