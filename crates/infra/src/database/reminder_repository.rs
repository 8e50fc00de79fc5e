//! SQLite-backed reminders, devices and notification outbox.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{DeviceRepository, NotificationQueue, ReminderRepository};
use hearth_domain::constants::NOTIFICATION_MAX_ATTEMPTS;
use hearth_domain::{
    DueReminder, NotificationJob, NotificationStatus, Result as DomainResult,
};
use rusqlite::params;
use serde::Serialize;

use super::manager::DbManager;
use super::support::{from_json, from_ts, new_id, to_json, to_ts, with_connection};
use crate::errors::sql_err;

const DUE_REMINDERS_SQL: &str = "SELECT id, user_id, title, description, reminder_time
    FROM reminders
    WHERE notification_sent = 0 AND completed = 0
      AND reminder_time >= ?1 AND reminder_time <= ?2
    ORDER BY reminder_time, id";

const MARK_SENT_SQL: &str = "UPDATE reminders SET notification_sent = 1 WHERE id = ?1";

const REMINDER_INSERT_SQL: &str = "INSERT INTO reminders
        (id, user_id, title, description, reminder_time, notification_sent, completed, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6)";

const ACTIVE_TOKENS_SQL: &str =
    "SELECT push_token FROM devices WHERE user_id = ?1 AND active = 1 ORDER BY rowid";

const DEVICE_UPSERT_SQL: &str = "INSERT INTO devices (id, user_id, push_token, active, created_at)
    VALUES (?1, ?2, ?3, 1, ?4)
    ON CONFLICT(push_token) DO UPDATE SET user_id = excluded.user_id, active = 1";

const OUTBOX_INSERT_SQL: &str = "INSERT INTO notification_outbox
        (id, device_token, title, body, data, status, attempts, max_attempts, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)";

const OUTBOX_PENDING_SQL: &str = "SELECT id, device_token, title, body, data, attempts, max_attempts, created_at
    FROM notification_outbox WHERE status = ?1
    ORDER BY created_at, rowid LIMIT ?2";

pub struct SqliteReminderRepository {
    db: Arc<DbManager>,
}

impl SqliteReminderRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Store a new reminder; returns its id.
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
        reminder_time: DateTime<Utc>,
    ) -> DomainResult<String> {
        let user_id = user_id.to_string();
        let title = title.to_string();
        let description = description.map(str::to_string);
        with_connection(&self.db, move |conn| {
            let id = new_id();
            conn.execute(
                REMINDER_INSERT_SQL,
                params![id, user_id, title, description, to_ts(reminder_time), Utc::now().timestamp()],
            )
            .map_err(sql_err)?;
            Ok(id)
        })
        .await
    }

    pub async fn register_device(&self, user_id: &str, push_token: &str) -> DomainResult<()> {
        let user_id = user_id.to_string();
        let push_token = push_token.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute(
                DEVICE_UPSERT_SQL,
                params![new_id(), user_id, push_token, Utc::now().timestamp()],
            )
            .map_err(sql_err)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ReminderRepository for SqliteReminderRepository {
    async fn find_due(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<DueReminder>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn.prepare(DUE_REMINDERS_SQL).map_err(sql_err)?;
            let rows = stmt
                .query_map(params![to_ts(from), to_ts(to)], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;

            rows.into_iter()
                .map(|(id, user_id, title, description, at)| {
                    Ok(DueReminder { id, user_id, title, description, reminder_time: from_ts(at)? })
                })
                .collect()
        })
        .await
    }

    async fn mark_sent(&self, reminder_id: &str) -> DomainResult<()> {
        let reminder_id = reminder_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute(MARK_SENT_SQL, params![reminder_id]).map_err(sql_err)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl DeviceRepository for SqliteReminderRepository {
    async fn active_tokens(&self, user_id: &str) -> DomainResult<Vec<String>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn.prepare(ACTIVE_TOKENS_SQL).map_err(sql_err)?;
            let tokens = stmt
                .query_map(params![user_id], |row| row.get::<_, String>(0))
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            Ok(tokens)
        })
        .await
    }
}

/// Outbox row as seen by the delivery worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: String,
    pub job: NotificationJob,
    pub attempts: i64,
    pub max_attempts: i64,
    pub created_at: DateTime<Utc>,
}

/// Durable notification queue; delivery happens elsewhere.
pub struct SqliteNotificationOutbox {
    db: Arc<DbManager>,
}

impl SqliteNotificationOutbox {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Oldest pending jobs first.
    pub async fn pending(&self, limit: usize) -> DomainResult<Vec<OutboxEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        with_connection(&self.db, move |conn| {
            let mut stmt = conn.prepare(OUTBOX_PENDING_SQL).map_err(sql_err)?;
            let rows = stmt
                .query_map(params![NotificationStatus::Pending.to_string(), limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                })
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;

            rows.into_iter()
                .map(|(id, device_token, title, body, data, attempts, max_attempts, created_at)| {
                    let data: BTreeMap<String, String> = from_json("data", &data)?;
                    Ok(OutboxEntry {
                        id,
                        job: NotificationJob { device_token, title, body, data },
                        attempts,
                        max_attempts,
                        created_at: from_ts(created_at)?,
                    })
                })
                .collect()
        })
        .await
    }
}

#[async_trait]
impl NotificationQueue for SqliteNotificationOutbox {
    async fn enqueue(&self, job: NotificationJob) -> DomainResult<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                OUTBOX_INSERT_SQL,
                params![
                    new_id(),
                    job.device_token,
                    job.title,
                    job.body,
                    to_json(&job.data)?,
                    NotificationStatus::Pending.to_string(),
                    NOTIFICATION_MAX_ATTEMPTS,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(sql_err)?;
            Ok(())
        })
        .await
    }
}
