use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hearth_domain::constants::REMINDER_SCAN_WINDOW_SECS;
use hearth_domain::{NotificationJob, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::ports::{DeviceRepository, NotificationQueue, ReminderRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub reminders: usize,
    pub notifications: usize,
}

/// Turns due reminders into queued push notifications.
pub struct ReminderDispatcher {
    reminders: Arc<dyn ReminderRepository>,
    devices: Arc<dyn DeviceRepository>,
    queue: Arc<dyn NotificationQueue>,
}

impl ReminderDispatcher {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        devices: Arc<dyn DeviceRepository>,
        queue: Arc<dyn NotificationQueue>,
    ) -> Self {
        Self { reminders, devices, queue }
    }

    /// Enqueue one notification per active device for every reminder due in
    /// the minute ending at `now`, then mark the reminder sent.
    ///
    /// A reminder is marked only after all its jobs were queued, so an
    /// enqueue failure leaves it due for the next scan.
    #[instrument(skip(self))]
    pub async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<DispatchSummary> {
        let from = now - Duration::seconds(REMINDER_SCAN_WINDOW_SECS);
        let due = self.reminders.find_due(from, now).await?;
        let mut summary = DispatchSummary::default();

        for reminder in &due {
            let tokens = self.devices.active_tokens(&reminder.user_id).await?;
            for token in tokens {
                self.queue.enqueue(NotificationJob::for_reminder(token, reminder)).await?;
                summary.notifications += 1;
            }
            self.reminders.mark_sent(&reminder.id).await?;
            summary.reminders += 1;
            debug!(reminder_id = %reminder.id, "Reminder dispatched");
        }

        if summary.reminders > 0 {
            info!(
                reminders = summary.reminders,
                notifications = summary.notifications,
                "Reminder notifications queued"
            );
        }
        Ok(summary)
    }
}
