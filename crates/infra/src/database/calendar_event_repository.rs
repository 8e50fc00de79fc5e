//! SQLite-backed calendar event store with transactional bulk replacement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hearth_core::CalendarEventRepository;
use hearth_domain::constants::HOLIDAY_EVENT_DESCRIPTION;
use hearth_domain::{
    CalendarEvent, EventSource, Holiday, NormalizedEvent, Result as DomainResult,
};
use rusqlite::{params, Row};

use super::manager::DbManager;
use super::support::{from_opt_json, from_ts, new_id, to_json, to_ts, with_connection};
use crate::errors::sql_err;

const EVENT_COLUMNS: &str = "id, account_id, user_id, external_id, holiday_id, summary, \
     description, location, starts_at, ends_at, source, is_holiday, is_meal, metadata";

const EVENT_INSERT_SQL: &str = "INSERT INTO calendar_events (
        id, account_id, user_id, external_id, holiday_id, summary, description, location,
        starts_at, ends_at, source, is_holiday, is_meal, metadata
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13)";

const ACCOUNT_EVENTS_DELETE_SQL: &str =
    "DELETE FROM calendar_events WHERE account_id = ?1 AND is_meal = 0";

const HOLIDAY_EVENTS_DELETE_SQL: &str = "DELETE FROM calendar_events
    WHERE user_id = ?1 AND is_holiday = 1 AND source = ?2
      AND starts_at >= ?3 AND starts_at < ?4";

const ACCOUNT_SYNCED_SQL: &str =
    "UPDATE calendar_accounts SET last_synced_at = ?2, updated_at = ?2 WHERE id = ?1";

pub struct SqliteCalendarEventRepository {
    db: Arc<DbManager>,
}

impl SqliteCalendarEventRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn list_where(
        &self,
        clause: &'static str,
        key: String,
    ) -> DomainResult<Vec<CalendarEvent>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {EVENT_COLUMNS} FROM calendar_events WHERE {clause}
                     ORDER BY starts_at, id"
                ))
                .map_err(sql_err)?;
            let rows = stmt
                .query_map(params![key], map_event_row)
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            rows.into_iter().map(RawEvent::into_event).collect()
        })
        .await
    }
}

struct RawEvent {
    id: String,
    account_id: Option<String>,
    user_id: String,
    external_id: Option<String>,
    holiday_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    starts_at: i64,
    ends_at: i64,
    source: String,
    is_holiday: bool,
    is_meal: bool,
    metadata: Option<String>,
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        id: row.get(0)?,
        account_id: row.get(1)?,
        user_id: row.get(2)?,
        external_id: row.get(3)?,
        holiday_id: row.get(4)?,
        summary: row.get(5)?,
        description: row.get(6)?,
        location: row.get(7)?,
        starts_at: row.get(8)?,
        ends_at: row.get(9)?,
        source: row.get(10)?,
        is_holiday: row.get::<_, i64>(11)? != 0,
        is_meal: row.get::<_, i64>(12)? != 0,
        metadata: row.get(13)?,
    })
}

impl RawEvent {
    fn into_event(self) -> DomainResult<CalendarEvent> {
        Ok(CalendarEvent {
            id: self.id,
            account_id: self.account_id,
            user_id: self.user_id,
            external_id: self.external_id,
            holiday_id: self.holiday_id,
            summary: self.summary,
            description: self.description,
            location: self.location,
            starts_at: from_ts(self.starts_at)?,
            ends_at: from_ts(self.ends_at)?,
            source: self.source,
            is_holiday: self.is_holiday,
            is_meal: self.is_meal,
            metadata: from_opt_json("metadata", self.metadata)?,
        })
    }
}

#[async_trait]
impl CalendarEventRepository for SqliteCalendarEventRepository {
    async fn replace_account_events(
        &self,
        account_id: &str,
        user_id: &str,
        source: EventSource,
        events: Vec<NormalizedEvent>,
        synced_at: DateTime<Utc>,
    ) -> DomainResult<usize> {
        let account_id = account_id.to_string();
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let tx = conn.transaction().map_err(sql_err)?;
            tx.execute(ACCOUNT_EVENTS_DELETE_SQL, params![account_id]).map_err(sql_err)?;

            {
                let mut insert = tx.prepare(EVENT_INSERT_SQL).map_err(sql_err)?;
                for event in &events {
                    let metadata = event.metadata.as_ref().map(to_json).transpose()?;
                    insert
                        .execute(params![
                            new_id(),
                            account_id,
                            user_id,
                            event.external_id,
                            Option::<String>::None,
                            event.summary,
                            event.description,
                            event.location,
                            to_ts(event.starts_at),
                            to_ts(event.ends_at),
                            source.to_string(),
                            0,
                            metadata,
                        ])
                        .map_err(sql_err)?;
                }
            }

            tx.execute(ACCOUNT_SYNCED_SQL, params![account_id, to_ts(synced_at)])
                .map_err(sql_err)?;
            tx.commit().map_err(sql_err)?;
            Ok(events.len())
        })
        .await
    }

    async fn replace_holiday_events(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        holidays: Vec<Holiday>,
    ) -> DomainResult<usize> {
        let user_id = user_id.to_string();
        let source = EventSource::Calendarific.to_string();

        with_connection(&self.db, move |conn| {
            let tx = conn.transaction().map_err(sql_err)?;
            tx.execute(HOLIDAY_EVENTS_DELETE_SQL, params![user_id, source, to_ts(from), to_ts(to)])
                .map_err(sql_err)?;

            {
                let mut insert = tx.prepare(EVENT_INSERT_SQL).map_err(sql_err)?;
                for holiday in &holidays {
                    insert
                        .execute(params![
                            new_id(),
                            Option::<String>::None,
                            user_id,
                            Option::<String>::None,
                            holiday.id,
                            holiday.name,
                            HOLIDAY_EVENT_DESCRIPTION,
                            Option::<String>::None,
                            to_ts(holiday.date),
                            to_ts(holiday.date + Duration::days(1)),
                            source,
                            1,
                            Option::<String>::None,
                        ])
                        .map_err(sql_err)?;
                }
            }

            tx.commit().map_err(sql_err)?;
            Ok(holidays.len())
        })
        .await
    }

    async fn list_for_account(&self, account_id: &str) -> DomainResult<Vec<CalendarEvent>> {
        self.list_where("account_id = ?1", account_id.to_string()).await
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<CalendarEvent>> {
        self.list_where("user_id = ?1", user_id.to_string()).await
    }
}
