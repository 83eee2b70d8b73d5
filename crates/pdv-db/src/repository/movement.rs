//! # Movement Repository
//!
//! Manual cash insertions ("reforço") and withdrawals ("sangria").
//!
//! Movements are only ever appended, and only through
//! [`RegisterSessionRepository::record_movement`](super::register::RegisterSessionRepository::record_movement),
//! which writes the row and bumps the session aggregate in one transaction.
//! This repository is the read side.

use chrono::{DateTime, Utc};
use pdv_core::{Money, Movement, MovementKind};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, FromRow)]
struct MovementRow {
    id: String,
    session_id: String,
    kind: MovementKind,
    amount_cents: i64,
    reason: String,
    occurred_at: DateTime<Utc>,
    recorded_by: String,
}

impl From<MovementRow> for Movement {
    fn from(row: MovementRow) -> Self {
        Movement {
            id: row.id,
            session_id: row.session_id,
            kind: row.kind,
            amount: Money::from_cents(row.amount_cents),
            reason: row.reason,
            occurred_at: row.occurred_at,
            recorded_by: row.recorded_by,
        }
    }
}

/// Repository for movement reads.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// All movements of a session, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Movement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, kind, amount_cents, reason, occurred_at, recorded_by
            FROM movements
            WHERE session_id = ?1
            ORDER BY occurred_at ASC, rowid ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Movement::from).collect())
    }
}

/// Appends a movement row on an existing connection or transaction.
pub(crate) async fn insert(conn: &mut SqliteConnection, movement: &Movement) -> DbResult<()> {
    debug!(
        id = %movement.id,
        session_id = %movement.session_id,
        kind = ?movement.kind,
        amount_cents = movement.amount.cents(),
        "Inserting movement"
    );

    sqlx::query(
        r#"
        INSERT INTO movements (
            id, session_id, kind, amount_cents, reason, occurred_at, recorded_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.session_id)
    .bind(movement.kind)
    .bind(movement.amount.cents())
    .bind(&movement.reason)
    .bind(movement.occurred_at)
    .bind(&movement.recorded_by)
    .execute(conn)
    .await?;

    Ok(())
}
