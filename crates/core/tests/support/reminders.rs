use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{DeviceRepository, NotificationQueue, ReminderRepository};
use hearth_domain::{DueReminder, NotificationJob, Result as DomainResult};

/// Stored reminder with its delivery flags.
#[derive(Debug, Clone)]
pub struct StoredReminder {
    pub reminder: DueReminder,
    pub sent: bool,
    pub completed: bool,
}

#[derive(Default, Clone)]
pub struct MockReminderRepository {
    reminders: Arc<Mutex<Vec<StoredReminder>>>,
}

impl MockReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminder(self, reminder: DueReminder, sent: bool, completed: bool) -> Self {
        self.reminders.lock().unwrap().push(StoredReminder { reminder, sent, completed });
        self
    }

    pub fn is_sent(&self, reminder_id: &str) -> bool {
        self.reminders
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.reminder.id == reminder_id && r.sent)
    }
}

#[async_trait]
impl ReminderRepository for MockReminderRepository {
    async fn find_due(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<DueReminder>> {
        Ok(self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                !r.sent
                    && !r.completed
                    && r.reminder.reminder_time >= from
                    && r.reminder.reminder_time <= to
            })
            .map(|r| r.reminder.clone())
            .collect())
    }

    async fn mark_sent(&self, reminder_id: &str) -> DomainResult<()> {
        for stored in self.reminders.lock().unwrap().iter_mut() {
            if stored.reminder.id == reminder_id {
                stored.sent = true;
            }
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MockDeviceRepository {
    tokens: Arc<Mutex<BTreeMap<String, Vec<String>>>>,
}

impl MockDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, user_id: &str, token: &str) -> Self {
        self.tokens
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .push(token.to_string());
        self
    }
}

#[async_trait]
impl DeviceRepository for MockDeviceRepository {
    async fn active_tokens(&self, user_id: &str) -> DomainResult<Vec<String>> {
        Ok(self.tokens.lock().unwrap().get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub struct RecordingQueue {
    jobs: Arc<Mutex<Vec<NotificationJob>>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<NotificationJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationQueue for RecordingQueue {
    async fn enqueue(&self, job: NotificationJob) -> DomainResult<()> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

pub fn reminder(id: &str, user_id: &str, at: DateTime<Utc>) -> DueReminder {
    DueReminder {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: format!("Reminder {id}"),
        description: None,
        reminder_time: at,
    }
}
