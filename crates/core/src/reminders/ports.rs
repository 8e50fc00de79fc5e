//! Port interfaces for reminders and push delivery

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_domain::{DueReminder, NotificationJob, Result};

/// Read and acknowledge reminders
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Unsent, uncompleted reminders with `from <= reminder_time <= to`
    async fn find_due(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<DueReminder>>;

    async fn mark_sent(&self, reminder_id: &str) -> Result<()>;
}

/// Push-capable devices registered by users
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn active_tokens(&self, user_id: &str) -> Result<Vec<String>>;
}

/// Outbound notification queue
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, job: NotificationJob) -> Result<()>;
}
