//! # Repository Errors
//!
//! ```text
//! sqlx::Error ──┐                      ┌── NotFound / UniqueViolation / ...
//!               ├──► DbError ──► ApiError (status + JSON body)
//! CoreError  ───┘                      └── Core(..) keeps the caixa rule intact
//! ```

use pdv_core::CoreError;
use thiserror::Error;

/// Message raised by the schema triggers that freeze closed sessions.
pub(crate) const FROZEN_SESSION_MESSAGE: &str = "register session is closed";

/// Everything a repository call can fail with.
///
/// Domain errors raised while a repository applies a session transition
/// pass through untouched in [`DbError::Core`], so callers can still tell a
/// double close from a broken connection.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A duplicate operator username, or a second open session on a till
    /// slipping past the pre-check and hitting the partial unique index.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A caixa rule refused the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure. Also raised by the schema triggers that freeze closed sessions.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the error is a UNIQUE violation on the given `table.column`.
    pub fn is_unique_violation_on(&self, target: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(target))
    }

    /// True when a trigger refused to touch a closed session.
    pub(crate) fn is_frozen_session(&self) -> bool {
        matches!(self, DbError::QueryFailed(msg) if msg.contains(FROZEN_SESSION_MESSAGE))
    }
}

/// SQLite reports constraint failures only through the message text, so
/// that is what gets inspected.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_target() {
        let err = DbError::duplicate("register_sessions.till_id", "caixa-01");
        assert!(err.is_unique_violation_on("register_sessions.till_id"));
        assert!(!err.is_unique_violation_on("operators.username"));
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err: DbError = CoreError::SessionAlreadyClosed("s1".into()).into();
        assert!(matches!(
            err,
            DbError::Core(CoreError::SessionAlreadyClosed(_))
        ));
        assert!(err.to_string().contains("s1"));
    }
}
