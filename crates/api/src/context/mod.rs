//! Application context - dependency injection container

use std::sync::Arc;

use hearth_core::{
    CalendarSyncService, HolidaySyncService, MealPlanService, ReminderDispatcher, SecretCipher,
};
use hearth_domain::{Config, HearthError, Result};
use hearth_infra::integrations::calendar::{
    AppleCalendarAdapter, CalDavClient, GoogleCalendarClient, GoogleEndpoints,
};
use hearth_infra::scheduling::{build_job_scheduler, CronScheduler, JobServices};
use hearth_infra::{
    AesSecretCipher, CalendarificClient, DbManager, HttpClient, SpoonacularClient,
    SqliteCalendarAccountRepository, SqliteCalendarEventRepository, SqliteHolidayRepository,
    SqliteMealPlanRepository, SqliteNotificationOutbox, SqliteReminderRepository,
    SqliteUserRepository,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Base URLs of the third-party APIs. Defaults are the production endpoints;
/// tests point them at local mock servers.
#[derive(Debug, Clone, Default)]
pub struct IntegrationEndpoints {
    pub google: Option<GoogleEndpoints>,
    pub spoonacular_base: Option<String>,
    pub calendarific_url: Option<String>,
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub cipher: Arc<AesSecretCipher>,
    pub users: Arc<SqliteUserRepository>,
    pub calendar: Arc<CalendarSyncService>,
    pub calendar_events: Arc<SqliteCalendarEventRepository>,
    pub holidays: Arc<HolidaySyncService>,
    pub meal_plans: Arc<MealPlanService>,
    pub reminders: Arc<ReminderDispatcher>,
    pub reminder_store: Arc<SqliteReminderRepository>,
    pub outbox: Arc<SqliteNotificationOutbox>,
    scheduler: Mutex<CronScheduler>,
}

impl AppContext {
    /// Create the context against the production endpoints.
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_endpoints(config, IntegrationEndpoints::default()).await
    }

    /// Create the context, overriding integration base URLs.
    ///
    /// Opens the database, applies migrations and wires every repository,
    /// adapter and service. The scheduler is built but not started.
    pub async fn with_endpoints(config: Config, endpoints: IntegrationEndpoints) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let cipher = Arc::new(AesSecretCipher::from_config(&config.security));
        if !cipher.is_configured() {
            warn!("TOKEN_ENCRYPTION_KEY not set; calendar credentials cannot be stored or read");
        }
        let dyn_cipher: Arc<dyn SecretCipher> = cipher.clone();

        let http = HttpClient::from_config(&config.http)?;

        // Repositories
        let users = Arc::new(SqliteUserRepository::new(db.clone()));
        let accounts = Arc::new(SqliteCalendarAccountRepository::new(db.clone()));
        let calendar_events = Arc::new(SqliteCalendarEventRepository::new(db.clone()));
        let holiday_store = Arc::new(SqliteHolidayRepository::new(db.clone()));
        let plans = Arc::new(SqliteMealPlanRepository::new(db.clone()));
        let reminder_store = Arc::new(SqliteReminderRepository::new(db.clone()));
        let outbox = Arc::new(SqliteNotificationOutbox::new(db.clone()));

        // Provider adapters
        let mut google =
            GoogleCalendarClient::new(http.clone(), config.google.clone(), dyn_cipher.clone());
        if let Some(google_endpoints) = endpoints.google {
            google = google.with_endpoints(google_endpoints);
        }
        let google = Arc::new(google);

        let caldav = CalDavClient::new(&config.apple.caldav_endpoint)?;
        let principal_resolver = Arc::new(caldav.clone());
        let apple = Arc::new(AppleCalendarAdapter::new(caldav, dyn_cipher.clone()));

        let mut spoonacular = SpoonacularClient::new(http.clone(), &config.spoonacular);
        if let Some(base) = endpoints.spoonacular_base {
            spoonacular = spoonacular.with_base_url(base);
        }
        let mut calendarific = CalendarificClient::new(http, &config.calendarific);
        if let Some(url) = endpoints.calendarific_url {
            calendarific = calendarific.with_url(url);
        }

        // Services
        let calendar = Arc::new(
            CalendarSyncService::new(accounts, calendar_events.clone(), dyn_cipher)
                .with_adapter(google.clone())
                .with_adapter(apple)
                .with_google(google, config.google.clone())
                .with_principal_resolver(principal_resolver),
        );
        let holidays = Arc::new(HolidaySyncService::new(
            holiday_store.clone(),
            calendar_events.clone(),
            users.clone(),
            Arc::new(calendarific),
        ));
        let meal_plans = Arc::new(MealPlanService::new(
            plans,
            holiday_store,
            users.clone(),
            Arc::new(spoonacular),
        ));
        let reminders = Arc::new(ReminderDispatcher::new(
            reminder_store.clone(),
            reminder_store.clone(),
            outbox.clone(),
        ));

        let scheduler = build_job_scheduler(
            &config.scheduler,
            JobServices {
                calendar: calendar.clone(),
                holidays: holidays.clone(),
                meals: meal_plans.clone(),
                reminders: reminders.clone(),
            },
        );

        info!(db_path = %db.path().display(), "Application context initialised");

        Ok(Self {
            config,
            db,
            cipher,
            users,
            calendar,
            calendar_events,
            holidays,
            meal_plans,
            reminders,
            reminder_store,
            outbox,
            scheduler: Mutex::new(scheduler),
        })
    }

    /// Start the background jobs unless disabled in configuration.
    ///
    /// Returns whether the scheduler is running afterwards.
    pub async fn start_scheduler(&self) -> Result<bool> {
        if !self.config.scheduler.enabled {
            info!("Scheduler disabled by configuration");
            return Ok(false);
        }

        let mut scheduler = self.scheduler.lock().await;
        scheduler.start().await.map_err(HearthError::from)?;
        info!(jobs = ?scheduler.job_names(), "Background jobs scheduled");
        Ok(true)
    }

    pub async fn scheduler_running(&self) -> bool {
        self.scheduler.lock().await.is_running()
    }

    /// Check the database and report which integrations are configured.
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new()
            .add_component(self.check_database_health().await)
            .add_component(ComponentHealth::configured(
                "secret_codec",
                self.cipher.is_configured(),
                "TOKEN_ENCRYPTION_KEY",
            ))
            .add_component(ComponentHealth::configured(
                "google_oauth",
                self.config.google.credentials().is_some(),
                "GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET",
            ))
            .add_component(ComponentHealth::configured(
                "spoonacular",
                self.config.spoonacular.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                "SPOONACULAR_API_KEY",
            ))
            .add_component(ComponentHealth::configured(
                "calendarific",
                self.config.calendarific.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                "CALENDARIFIC_API_KEY",
            ));

        status.calculate_score();
        status
    }

    /// Runs the probe query on the blocking pool.
    async fn check_database_health(&self) -> ComponentHealth {
        let db = self.db.clone();
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {e}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {e}"))
            }
        }
    }

    /// Stop the background jobs. Safe to call when they never started.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");

        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_running() {
            scheduler.stop().await.map_err(HearthError::from)?;
        }
        Ok(())
    }
}
