//! Helpers shared by the SQLite repositories.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hearth_common::storage::SqliteConnection;
use hearth_domain::{HearthError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Run `op` on a pooled connection inside `spawn_blocking`.
pub(crate) async fn with_connection<T, F>(db: &Arc<DbManager>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    task::spawn_blocking(move || {
        let mut conn = db.get_connection()?;
        op(&mut conn)
    })
    .await
    .map_err(map_join_error)?
}

pub(crate) fn map_join_error(err: task::JoinError) -> HearthError {
    if err.is_cancelled() {
        HearthError::Internal("blocking task cancelled".into())
    } else {
        HearthError::Internal(format!("blocking task failed: {err}"))
    }
}

pub(crate) fn to_ts(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub(crate) fn from_ts(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| HearthError::Database(format!("timestamp out of range: {secs}")))
}

pub(crate) fn from_opt_ts(secs: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    secs.map(from_ts).transpose()
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| InfraError::from(e).into())
}

/// Decode a JSON column; malformed content is a `Database` error.
pub(crate) fn from_json<T: DeserializeOwned>(column: &str, text: &str) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| HearthError::Database(format!("invalid JSON in column {column}: {e}")))
}

pub(crate) fn from_opt_json<T: DeserializeOwned>(
    column: &str,
    text: Option<String>,
) -> Result<Option<T>> {
    text.as_deref().map(|t| from_json(column, t)).transpose()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
