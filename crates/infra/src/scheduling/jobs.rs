//! The four background jobs and their wiring into a [`CronScheduler`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use hearth_core::{CalendarSyncService, HolidaySyncService, MealPlanService, ReminderDispatcher};
use hearth_domain::constants::MEAL_PREFETCH_DAYS;
use hearth_domain::{Result, SchedulerConfig};
use tracing::{debug, info};

use super::cron_scheduler::{CronScheduler, CronSchedulerConfig, ScheduledTask};

/// Hourly sync of every linked calendar account.
pub struct CalendarSweepTask {
    service: Arc<CalendarSyncService>,
}

impl CalendarSweepTask {
    pub fn new(service: Arc<CalendarSyncService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledTask for CalendarSweepTask {
    fn name(&self) -> &'static str {
        "calendar_sweep"
    }

    async fn run(&self) -> Result<()> {
        let summary = self.service.sync_all_users().await?;
        debug!(accounts = summary.targets, failures = summary.failures, "Calendar sweep task done");
        Ok(())
    }
}

/// Nightly holiday refresh for the current and the next year.
pub struct HolidaySyncTask {
    service: Arc<HolidaySyncService>,
}

impl HolidaySyncTask {
    pub fn new(service: Arc<HolidaySyncService>) -> Self {
        Self { service }
    }
}

/// Years covered by a holiday sync started in `year`.
pub fn holiday_sync_years(year: i32) -> [i32; 2] {
    [year, year + 1]
}

#[async_trait]
impl ScheduledTask for HolidaySyncTask {
    fn name(&self) -> &'static str {
        "holiday_sync"
    }

    async fn run(&self) -> Result<()> {
        let years = holiday_sync_years(Utc::now().year());
        let summary = self.service.sync_all_users(&years).await?;
        info!(?years, users = summary.targets, failures = summary.failures, "Holiday sync finished");
        Ok(())
    }
}

pub struct MealPrefetchTask {
    service: Arc<MealPlanService>,
    days: u32,
}

impl MealPrefetchTask {
    pub fn new(service: Arc<MealPlanService>) -> Self {
        Self { service, days: MEAL_PREFETCH_DAYS }
    }
}

#[async_trait]
impl ScheduledTask for MealPrefetchTask {
    fn name(&self) -> &'static str {
        "meal_prefetch"
    }

    async fn run(&self) -> Result<()> {
        let summary = self.service.prefetch_all_users(self.days).await?;
        info!(users = summary.targets, failures = summary.failures, "Meal prefetch finished");
        Ok(())
    }
}

pub struct ReminderScanTask {
    dispatcher: Arc<ReminderDispatcher>,
}

impl ReminderScanTask {
    pub fn new(dispatcher: Arc<ReminderDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl ScheduledTask for ReminderScanTask {
    fn name(&self) -> &'static str {
        "reminder_scan"
    }

    async fn run(&self) -> Result<()> {
        let summary = self.dispatcher.dispatch_due(Utc::now()).await?;
        if summary.reminders > 0 {
            info!(
                reminders = summary.reminders,
                notifications = summary.notifications,
                "Reminders dispatched"
            );
        }
        Ok(())
    }
}

/// Services driven by the background jobs.
pub struct JobServices {
    pub calendar: Arc<CalendarSyncService>,
    pub holidays: Arc<HolidaySyncService>,
    pub meals: Arc<MealPlanService>,
    pub reminders: Arc<ReminderDispatcher>,
}

/// Register the four jobs on their configured cron expressions.
pub fn build_job_scheduler(config: &SchedulerConfig, services: JobServices) -> CronScheduler {
    let mut scheduler = CronScheduler::new(CronSchedulerConfig {
        job_timeout: Duration::from_secs(config.job_timeout_secs),
        ..CronSchedulerConfig::default()
    });

    scheduler
        .register(&config.calendar_sweep_cron, Arc::new(CalendarSweepTask::new(services.calendar)));
    scheduler
        .register(&config.holiday_sync_cron, Arc::new(HolidaySyncTask::new(services.holidays)));
    scheduler
        .register(&config.meal_prefetch_cron, Arc::new(MealPrefetchTask::new(services.meals)));
    scheduler.register(
        &config.reminder_scan_cron,
        Arc::new(ReminderScanTask::new(services.reminders)),
    );
    scheduler
}
