//! SQLite-backed holiday table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::HolidayRepository;
use hearth_domain::{Holiday, HolidayUpsert, Result as DomainResult};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::DbManager;
use super::support::{from_opt_json, from_ts, new_id, to_json, to_ts, with_connection};
use crate::errors::sql_err;

const HOLIDAY_COLUMNS: &str = "id, country_code, date, name, type, raw_payload";

const HOLIDAY_UPSERT_SQL: &str = "INSERT INTO holidays (id, country_code, date, name, type, raw_payload)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(country_code, date, name) DO UPDATE SET
        type = excluded.type,
        raw_payload = excluded.raw_payload";

pub struct SqliteHolidayRepository {
    db: Arc<DbManager>,
}

impl SqliteHolidayRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

type RawHoliday = (String, String, i64, String, Option<String>, Option<String>);

fn map_holiday_row(row: &Row<'_>) -> rusqlite::Result<RawHoliday> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn into_holiday(raw: RawHoliday) -> DomainResult<Holiday> {
    let (id, country_code, date, name, holiday_type, raw_payload) = raw;
    Ok(Holiday {
        id,
        country_code,
        date: from_ts(date)?,
        name,
        holiday_type,
        raw_payload: from_opt_json("raw_payload", raw_payload)?,
    })
}

#[async_trait]
impl HolidayRepository for SqliteHolidayRepository {
    async fn upsert(&self, holiday: HolidayUpsert) -> DomainResult<Holiday> {
        with_connection(&self.db, move |conn| {
            let date = to_ts(holiday.date);
            conn.execute(
                HOLIDAY_UPSERT_SQL,
                params![
                    new_id(),
                    holiday.country_code,
                    date,
                    holiday.name,
                    holiday.holiday_type,
                    to_json(&holiday.raw_payload)?,
                ],
            )
            .map_err(sql_err)?;

            let raw = conn
                .query_row(
                    &format!(
                        "SELECT {HOLIDAY_COLUMNS} FROM holidays
                         WHERE country_code = ?1 AND date = ?2 AND name = ?3"
                    ),
                    params![holiday.country_code, date, holiday.name],
                    map_holiday_row,
                )
                .map_err(sql_err)?;
            into_holiday(raw)
        })
        .await
    }

    async fn find_by_id(&self, holiday_id: &str) -> DomainResult<Option<Holiday>> {
        let holiday_id = holiday_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?1"),
                params![holiday_id],
                map_holiday_row,
            )
            .optional()
            .map_err(sql_err)?
            .map(into_holiday)
            .transpose()
        })
        .await
    }

    async fn find_in_range(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Option<Holiday>> {
        let country_code = country_code.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {HOLIDAY_COLUMNS} FROM holidays
                     WHERE country_code = ?1 AND date >= ?2 AND date < ?3
                     ORDER BY date, name LIMIT 1"
                ),
                params![country_code, to_ts(from), to_ts(to)],
                map_holiday_row,
            )
            .optional()
            .map_err(sql_err)?
            .map(into_holiday)
            .transpose()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::database::support::testing::test_db;

    fn christmas(holiday_type: &str) -> HolidayUpsert {
        HolidayUpsert {
            country_code: "GB".into(),
            date: Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap(),
            name: "Christmas Day".into(),
            holiday_type: Some(holiday_type.into()),
            raw_payload: serde_json::json!({ "name": "Christmas Day" }),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_refreshes_type_in_place() {
        let (db, _dir) = test_db();
        let repo = SqliteHolidayRepository::new(db);

        let first = repo.upsert(christmas("Public holiday")).await.unwrap();
        let second = repo.upsert(christmas("National holiday")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.holiday_type.as_deref(), Some("National holiday"));
        assert_eq!(repo.find_by_id(&first.id).await.unwrap(), Some(second));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn range_lookup_is_half_open() {
        let (db, _dir) = test_db();
        let repo = SqliteHolidayRepository::new(db);
        let stored = repo.upsert(christmas("National holiday")).await.unwrap();

        let day = stored.date;
        assert!(repo.find_in_range("GB", day, day + Duration::days(1)).await.unwrap().is_some());
        assert!(repo.find_in_range("GB", day - Duration::days(1), day).await.unwrap().is_none());
        assert!(repo.find_in_range("US", day, day + Duration::days(1)).await.unwrap().is_none());
    }
}
