//! # Operator Repository
//!
//! Back-office operator accounts used by the login endpoint. Passwords are
//! stored as argon2 PHC strings; hashing happens in the API layer.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// A stored operator account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OperatorRecord {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository for operator accounts.
#[derive(Debug, Clone)]
pub struct OperatorRepository {
    pool: SqlitePool,
}

impl OperatorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OperatorRepository { pool }
    }

    /// Looks up an operator by username (case-sensitive).
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<OperatorRecord>> {
        let operator = sqlx::query_as::<_, OperatorRecord>(
            r#"
            SELECT id, username, display_name, password_hash, is_active, created_at
            FROM operators
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(operator)
    }

    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
    ) -> DbResult<OperatorRecord> {
        let operator = OperatorRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO operators (
                id, username, display_name, password_hash, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&operator.id)
        .bind(&operator.username)
        .bind(&operator.display_name)
        .bind(&operator.password_hash)
        .bind(operator.is_active)
        .bind(operator.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: username.to_string(),
            },
            other => other,
        })?;

        info!(id = %operator.id, username = %operator.username, "Operator created");

        Ok(operator)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM operators")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
