//! Reminder and push notification records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::impl_domain_status_conversions;

/// Reminder whose notification window has opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueReminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub reminder_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl_domain_status_conversions!(NotificationStatus {
    Pending => "pending",
    Sent => "sent",
    Failed => "failed",
});

/// Push notification handed to the delivery outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationJob {
    pub device_token: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl NotificationJob {
    /// Job announcing `reminder` to one device.
    pub fn for_reminder(device_token: impl Into<String>, reminder: &DueReminder) -> Self {
        let body = reminder
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(crate::constants::REMINDER_FALLBACK_BODY)
            .to_string();
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), "reminder".to_string());
        data.insert("id".to_string(), reminder.id.clone());

        Self { device_token: device_token.into(), title: reminder.title.clone(), body, data }
    }
}
