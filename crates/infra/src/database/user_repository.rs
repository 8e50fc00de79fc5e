//! SQLite-backed user directory.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::UserDirectory;
use hearth_domain::{Result as DomainResult, UserPreferences};
use rusqlite::{params, OptionalExtension};

use super::manager::DbManager;
use super::support::with_connection;
use crate::errors::sql_err;

const USER_INSERT_SQL: &str =
    "INSERT OR IGNORE INTO users (id, email, created_at) VALUES (?1, ?2, ?3)";
const USER_IDS_SQL: &str = "SELECT id FROM users ORDER BY created_at, id";
const PREFERENCES_SELECT_SQL: &str =
    "SELECT user_id, locale FROM user_preferences WHERE user_id = ?1";
const PREFERENCES_ENSURE_SQL: &str =
    "INSERT OR IGNORE INTO user_preferences (user_id, locale, updated_at) VALUES (?1, NULL, ?2)";
const PREFERENCES_UPSERT_SQL: &str = "INSERT INTO user_preferences (user_id, locale, updated_at)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(user_id) DO UPDATE SET locale = excluded.locale, updated_at = excluded.updated_at";

pub struct SqliteUserRepository {
    db: Arc<DbManager>,
}

impl SqliteUserRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Register a user id; existing ids are left as they are.
    pub async fn create_user(&self, user_id: &str, email: Option<&str>) -> DomainResult<()> {
        let user_id = user_id.to_string();
        let email = email.map(str::to_string);
        with_connection(&self.db, move |conn| {
            conn.execute(USER_INSERT_SQL, params![user_id, email, Utc::now().timestamp()])
                .map_err(sql_err)?;
            Ok(())
        })
        .await
    }

    pub async fn set_locale(&self, user_id: &str, locale: Option<&str>) -> DomainResult<()> {
        let user_id = user_id.to_string();
        let locale = locale.map(str::to_string);
        with_connection(&self.db, move |conn| {
            conn.execute(PREFERENCES_UPSERT_SQL, params![user_id, locale, Utc::now().timestamp()])
                .map_err(sql_err)?;
            Ok(())
        })
        .await
    }
}

fn query_preferences(
    conn: &rusqlite::Connection,
    user_id: &str,
) -> DomainResult<Option<UserPreferences>> {
    conn.query_row(PREFERENCES_SELECT_SQL, params![user_id], |row| {
        Ok(UserPreferences { user_id: row.get(0)?, locale: row.get(1)? })
    })
    .optional()
    .map_err(sql_err)
}

#[async_trait]
impl UserDirectory for SqliteUserRepository {
    async fn list_user_ids(&self) -> DomainResult<Vec<String>> {
        with_connection(&self.db, |conn| {
            let mut stmt = conn.prepare(USER_IDS_SQL).map_err(sql_err)?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            Ok(ids)
        })
        .await
    }

    async fn find_preferences(&self, user_id: &str) -> DomainResult<Option<UserPreferences>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| query_preferences(conn, &user_id)).await
    }

    async fn ensure_preferences(&self, user_id: &str) -> DomainResult<UserPreferences> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute(PREFERENCES_ENSURE_SQL, params![user_id, Utc::now().timestamp()])
                .map_err(sql_err)?;
            Ok(query_preferences(conn, &user_id)?
                .unwrap_or(UserPreferences { user_id, locale: None }))
        })
        .await
    }
}
