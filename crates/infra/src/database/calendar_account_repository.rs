//! SQLite-backed calendar account store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::CalendarAccountRepository;
use hearth_domain::{
    CalendarAccount, CalendarAccountUpsert, CredentialUpdate, HearthError,
    Result as DomainResult,
};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::DbManager;
use super::support::{from_opt_ts, from_ts, new_id, to_ts, with_connection};
use crate::errors::sql_err;

const ACCOUNT_COLUMNS: &str = "id, user_id, provider, external_id, email, label, access_token_enc, \
     refresh_token_enc, expires_at, last_synced_at, created_at, updated_at";

// The refresh credential survives when the caller has none to offer.
const ACCOUNT_UPSERT_SQL: &str = "INSERT INTO calendar_accounts (
        id, user_id, provider, external_id, email, label, access_token_enc,
        refresh_token_enc, expires_at, last_synced_at, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10, ?10)
    ON CONFLICT(provider, external_id) DO UPDATE SET
        user_id = excluded.user_id,
        email = excluded.email,
        label = excluded.label,
        access_token_enc = excluded.access_token_enc,
        refresh_token_enc = COALESCE(excluded.refresh_token_enc, calendar_accounts.refresh_token_enc),
        expires_at = excluded.expires_at,
        last_synced_at = NULL,
        updated_at = excluded.updated_at";

const CREDENTIAL_UPDATE_SQL: &str = "UPDATE calendar_accounts SET
        access_token_enc = ?2,
        refresh_token_enc = COALESCE(?3, refresh_token_enc),
        expires_at = COALESCE(?4, expires_at),
        updated_at = ?5
    WHERE id = ?1";

const OWNER_IDS_SQL: &str = "SELECT DISTINCT user_id FROM calendar_accounts ORDER BY user_id";

pub struct SqliteCalendarAccountRepository {
    db: Arc<DbManager>,
}

impl SqliteCalendarAccountRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_account_row(row: &Row<'_>) -> rusqlite::Result<RawAccount> {
    Ok(RawAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: row.get(2)?,
        external_id: row.get(3)?,
        email: row.get(4)?,
        label: row.get(5)?,
        access_token_enc: row.get(6)?,
        refresh_token_enc: row.get(7)?,
        expires_at: row.get(8)?,
        last_synced_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Row as stored, before timestamp conversion.
struct RawAccount {
    id: String,
    user_id: String,
    provider: String,
    external_id: String,
    email: Option<String>,
    label: Option<String>,
    access_token_enc: String,
    refresh_token_enc: Option<String>,
    expires_at: Option<i64>,
    last_synced_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl RawAccount {
    fn into_account(self) -> DomainResult<CalendarAccount> {
        Ok(CalendarAccount {
            id: self.id,
            user_id: self.user_id,
            provider: self.provider,
            external_id: self.external_id,
            email: self.email,
            label: self.label,
            access_token_enc: self.access_token_enc,
            refresh_token_enc: self.refresh_token_enc,
            expires_at: from_opt_ts(self.expires_at)?,
            last_synced_at: from_opt_ts(self.last_synced_at)?,
            created_at: from_ts(self.created_at)?,
            updated_at: from_ts(self.updated_at)?,
        })
    }
}

fn query_by_id(conn: &rusqlite::Connection, id: &str) -> DomainResult<Option<CalendarAccount>> {
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM calendar_accounts WHERE id = ?1"),
        params![id],
        map_account_row,
    )
    .optional()
    .map_err(sql_err)?
    .map(RawAccount::into_account)
    .transpose()
}

#[async_trait]
impl CalendarAccountRepository for SqliteCalendarAccountRepository {
    async fn find_by_id(&self, account_id: &str) -> DomainResult<Option<CalendarAccount>> {
        let account_id = account_id.to_string();
        with_connection(&self.db, move |conn| query_by_id(conn, &account_id)).await
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<CalendarAccount>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM calendar_accounts
                     WHERE user_id = ?1 ORDER BY created_at, id"
                ))
                .map_err(sql_err)?;
            let rows = stmt
                .query_map(params![user_id], map_account_row)
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            rows.into_iter().map(RawAccount::into_account).collect()
        })
        .await
    }

    async fn list_owner_ids(&self) -> DomainResult<Vec<String>> {
        with_connection(&self.db, |conn| {
            let mut stmt = conn.prepare(OWNER_IDS_SQL).map_err(sql_err)?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            Ok(ids)
        })
        .await
    }

    async fn upsert(&self, data: CalendarAccountUpsert) -> DomainResult<CalendarAccount> {
        with_connection(&self.db, move |conn| {
            let provider = data.provider.to_string();
            conn.execute(
                ACCOUNT_UPSERT_SQL,
                params![
                    new_id(),
                    data.user_id,
                    provider,
                    data.external_id,
                    data.email,
                    data.label,
                    data.access_token_enc,
                    data.refresh_token_enc,
                    data.expires_at.map(to_ts),
                    Utc::now().timestamp(),
                ],
            )
            .map_err(sql_err)?;

            conn.query_row(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM calendar_accounts
                     WHERE provider = ?1 AND external_id = ?2"
                ),
                params![provider, data.external_id],
                map_account_row,
            )
            .map_err(sql_err)?
            .into_account()
        })
        .await
    }

    async fn update_credentials(
        &self,
        account_id: &str,
        update: CredentialUpdate,
    ) -> DomainResult<()> {
        let account_id = account_id.to_string();
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    CREDENTIAL_UPDATE_SQL,
                    params![
                        account_id,
                        update.access_token_enc,
                        update.refresh_token_enc,
                        update.expires_at.map(to_ts),
                        Utc::now().timestamp(),
                    ],
                )
                .map_err(sql_err)?;
            if changed == 0 {
                return Err(HearthError::NotFound(format!("calendar account {account_id}")));
            }
            Ok(())
        })
        .await
    }
}
