//! Conversions from external infrastructure errors into domain errors.

use hearth_common::crypto::CodecError;
use hearth_common::storage::StorageError;
use hearth_domain::HearthError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub HearthError);

impl From<InfraError> for HearthError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<HearthError> for InfraError {
    fn from(value: HearthError) -> Self {
        InfraError(value)
    }
}

trait IntoHearthError {
    fn into_hearth(self) -> HearthError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → HearthError */
/* -------------------------------------------------------------------------- */

impl IntoHearthError for SqlError {
    fn into_hearth(self) -> HearthError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => HearthError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        HearthError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        HearthError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        HearthError::Database("foreign key constraint violation".into())
                    }
                    _ => HearthError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => HearthError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                HearthError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                HearthError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidQuery => HearthError::Database("invalid SQL query".into()),
            other => HearthError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_hearth())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → HearthError */
/* -------------------------------------------------------------------------- */

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Rusqlite(err) => InfraError::from(err),
            StorageError::InvalidConfig(msg) => InfraError(HearthError::Config(msg)),
            other => InfraError(HearthError::Database(other.to_string())),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* CodecError → HearthError */
/* -------------------------------------------------------------------------- */

impl From<CodecError> for InfraError {
    fn from(value: CodecError) -> Self {
        let mapped = match value {
            CodecError::ConfigurationMissing => {
                HearthError::ConfigurationMissing("TOKEN_ENCRYPTION_KEY".into())
            }
            CodecError::InvalidPayload(msg) => HearthError::InvalidPayload(msg),
            CodecError::AuthenticationFailure => {
                HearthError::AuthenticationFailure("encrypted credential rejected".into())
            }
        };
        InfraError(mapped)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → HearthError */
/* -------------------------------------------------------------------------- */

impl IntoHearthError for HttpError {
    fn into_hearth(self) -> HearthError {
        if self.is_timeout() {
            return HearthError::Upstream("HTTP request timed out".into());
        }

        if self.is_connect() {
            return HearthError::Upstream("HTTP connection failure".into());
        }

        if self.is_decode() {
            return HearthError::Upstream(format!("malformed response body: {self}"));
        }

        if let Some(status) = self.status() {
            return HearthError::Upstream(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        HearthError::Upstream(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_hearth())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json → HearthError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(HearthError::Database(format!("invalid JSON column: {value}")))
    }
}

/// Shorthand used by repositories for `map_err`.
pub(crate) fn sql_err(err: SqlError) -> HearthError {
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
