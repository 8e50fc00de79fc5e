//! SQLite-backed meal plan templates and user overrides.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::{MealPlanRepository, OverrideUpsert};
use hearth_domain::{
    HearthError, MealPlanTemplate, MealPlanType, NewMealPlanTemplate, Result as DomainResult,
    UserMealOverride,
};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::DbManager;
use super::support::{from_json, from_opt_json, from_ts, new_id, to_json, with_connection};
use crate::errors::sql_err;

const TEMPLATE_COLUMNS: &str = "id, date_key, type, calories, macros, courses, created_at";
const OVERRIDE_COLUMNS: &str =
    "id, user_id, date_key, holiday_id, courses, calories, macros, notes, created_at, updated_at";

// First writer wins; later generations for the same key are discarded.
const TEMPLATE_INSERT_SQL: &str = "INSERT INTO meal_plan_templates
        (id, date_key, type, calories, macros, courses, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(date_key, type) DO NOTHING";

const OVERRIDE_INSERT_SQL: &str = "INSERT INTO user_meal_overrides
        (id, user_id, date_key, holiday_id, courses, calories, macros, notes, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)";

const OVERRIDE_UPDATE_SQL: &str = "UPDATE user_meal_overrides SET
        courses = ?2,
        calories = COALESCE(?3, calories),
        macros = COALESCE(?4, macros),
        notes = COALESCE(?5, notes),
        updated_at = ?6
    WHERE id = ?1";

pub struct SqliteMealPlanRepository {
    db: Arc<DbManager>,
}

impl SqliteMealPlanRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

struct RawTemplate {
    id: String,
    date_key: String,
    plan_type: String,
    calories: Option<f64>,
    macros: Option<String>,
    courses: String,
    created_at: i64,
}

fn map_template_row(row: &Row<'_>) -> rusqlite::Result<RawTemplate> {
    Ok(RawTemplate {
        id: row.get(0)?,
        date_key: row.get(1)?,
        plan_type: row.get(2)?,
        calories: row.get(3)?,
        macros: row.get(4)?,
        courses: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl RawTemplate {
    fn into_template(self) -> DomainResult<MealPlanTemplate> {
        let plan_type = self
            .plan_type
            .parse::<MealPlanType>()
            .map_err(|e| HearthError::Database(format!("meal_plan_templates.type: {e}")))?;
        Ok(MealPlanTemplate {
            id: self.id,
            date_key: self.date_key,
            plan_type,
            calories: self.calories,
            macros: from_opt_json("macros", self.macros)?,
            courses: from_json("courses", &self.courses)?,
            created_at: from_ts(self.created_at)?,
        })
    }
}

struct RawOverride {
    id: String,
    user_id: String,
    date_key: String,
    holiday_id: Option<String>,
    courses: String,
    calories: Option<f64>,
    macros: Option<String>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

fn map_override_row(row: &Row<'_>) -> rusqlite::Result<RawOverride> {
    Ok(RawOverride {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date_key: row.get(2)?,
        holiday_id: row.get(3)?,
        courses: row.get(4)?,
        calories: row.get(5)?,
        macros: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl RawOverride {
    fn into_override(self) -> DomainResult<UserMealOverride> {
        Ok(UserMealOverride {
            id: self.id,
            user_id: self.user_id,
            date_key: self.date_key,
            holiday_id: self.holiday_id,
            courses: from_json("courses", &self.courses)?,
            calories: self.calories,
            macros: from_opt_json("macros", self.macros)?,
            notes: self.notes,
            created_at: from_ts(self.created_at)?,
            updated_at: from_ts(self.updated_at)?,
        })
    }
}

fn query_override(
    conn: &rusqlite::Connection,
    user_id: &str,
    date_key: &str,
    holiday_id: Option<&str>,
) -> DomainResult<Option<UserMealOverride>> {
    conn.query_row(
        &format!(
            "SELECT {OVERRIDE_COLUMNS} FROM user_meal_overrides
             WHERE user_id = ?1 AND date_key = ?2 AND holiday_id IS ?3
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ),
        params![user_id, date_key, holiday_id],
        map_override_row,
    )
    .optional()
    .map_err(sql_err)?
    .map(RawOverride::into_override)
    .transpose()
}

fn query_template(
    conn: &rusqlite::Connection,
    date_key: &str,
    plan_type: MealPlanType,
) -> DomainResult<Option<MealPlanTemplate>> {
    conn.query_row(
        &format!(
            "SELECT {TEMPLATE_COLUMNS} FROM meal_plan_templates WHERE date_key = ?1 AND type = ?2"
        ),
        params![date_key, plan_type.to_string()],
        map_template_row,
    )
    .optional()
    .map_err(sql_err)?
    .map(RawTemplate::into_template)
    .transpose()
}

#[async_trait]
impl MealPlanRepository for SqliteMealPlanRepository {
    async fn find_latest_override(
        &self,
        user_id: &str,
        date_key: &str,
        holiday_id: Option<&str>,
    ) -> DomainResult<Option<UserMealOverride>> {
        let user_id = user_id.to_string();
        let date_key = date_key.to_string();
        let holiday_id = holiday_id.map(str::to_string);
        with_connection(&self.db, move |conn| {
            query_override(conn, &user_id, &date_key, holiday_id.as_deref())
        })
        .await
    }

    async fn upsert_override(
        &self,
        user_id: &str,
        date_key: &str,
        data: OverrideUpsert,
    ) -> DomainResult<UserMealOverride> {
        let user_id = user_id.to_string();
        let date_key = date_key.to_string();
        with_connection(&self.db, move |conn| {
            let courses = to_json(&data.courses)?;
            let macros = data.macros.as_ref().map(to_json).transpose()?;
            let now = Utc::now().timestamp();

            let tx = conn.transaction().map_err(sql_err)?;
            let existing = query_override(&tx, &user_id, &date_key, data.holiday_id.as_deref())?;
            let id = match existing {
                Some(found) => {
                    tx.execute(
                        OVERRIDE_UPDATE_SQL,
                        params![found.id, courses, data.calories, macros, data.notes, now],
                    )
                    .map_err(sql_err)?;
                    found.id
                }
                None => {
                    let id = new_id();
                    tx.execute(
                        OVERRIDE_INSERT_SQL,
                        params![
                            id,
                            user_id,
                            date_key,
                            data.holiday_id,
                            courses,
                            data.calories,
                            macros,
                            data.notes,
                            now,
                        ],
                    )
                    .map_err(sql_err)?;
                    id
                }
            };

            let stored = tx
                .query_row(
                    &format!("SELECT {OVERRIDE_COLUMNS} FROM user_meal_overrides WHERE id = ?1"),
                    params![id],
                    map_override_row,
                )
                .map_err(sql_err)?
                .into_override()?;
            tx.commit().map_err(sql_err)?;
            Ok(stored)
        })
        .await
    }

    async fn find_template(
        &self,
        date_key: &str,
        plan_type: MealPlanType,
    ) -> DomainResult<Option<MealPlanTemplate>> {
        let date_key = date_key.to_string();
        with_connection(&self.db, move |conn| query_template(conn, &date_key, plan_type)).await
    }

    async fn insert_template(
        &self,
        template: NewMealPlanTemplate,
    ) -> DomainResult<MealPlanTemplate> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                TEMPLATE_INSERT_SQL,
                params![
                    new_id(),
                    template.date_key,
                    template.plan_type.to_string(),
                    template.calories,
                    to_json(&template.macros)?,
                    to_json(&template.courses)?,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(sql_err)?;

            query_template(conn, &template.date_key, template.plan_type)?.ok_or_else(|| {
                HearthError::Internal(format!(
                    "template {} vanished after insert",
                    template.date_key
                ))
            })
        })
        .await
    }
}
