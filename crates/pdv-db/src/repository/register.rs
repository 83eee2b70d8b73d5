//! # Register Session Repository
//!
//! Persistence for caixa sessions. Every mutation loads the session inside a
//! `BEGIN IMMEDIATE` transaction, applies the pdv-core transition, and writes
//! the result back with a `status = 'open'` guard. Writers queue on SQLite's
//! busy timeout instead of failing, so concurrent calls see the state left
//! by the previous one.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Register Session Lifecycle                           │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open() → RegisterSession { counted: None }                     │
//! │         (partial unique index: one open session per till)              │
//! │                                                                         │
//! │  2. OPERATE                                                            │
//! │     └── record_movement() → Movement + insertions/withdrawals += x     │
//! │     └── accrue_sale()     → registered_<method> += x                   │
//! │                                                                         │
//! │  3. CLOSE (once)                                                       │
//! │     └── close() → counted totals written, status = 'closed'            │
//! │         (trigger rejects any later UPDATE of the row)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use pdv_core::{
    CloseRequest, ConferredTotals, CoreError, CountedTotals, Money, Movement, MovementKind,
    NewMovement, Pagination, PaymentMethod, PaymentTotals, RegisterSession, SessionStatus,
};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::movement;

const SELECT_SESSION: &str = r#"
    SELECT
        id, till_id, status, opened_at, opened_by, initial_float_cents,
        registered_cash_cents, registered_credit_cents, registered_debit_cents,
        registered_pix_cents, registered_other_cents,
        insertions_cents, withdrawals_cents,
        final_cash_cents, conferred_credit_cents, conferred_debit_cents,
        conferred_pix_cents, conferred_other_cents,
        closed_at, closed_by
    FROM register_sessions
"#;

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat table row. The nullable counted columns fold into
/// `RegisterSession::counted`.
#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    till_id: String,
    status: SessionStatus,
    opened_at: DateTime<Utc>,
    opened_by: String,
    initial_float_cents: i64,
    registered_cash_cents: i64,
    registered_credit_cents: i64,
    registered_debit_cents: i64,
    registered_pix_cents: i64,
    registered_other_cents: i64,
    insertions_cents: i64,
    withdrawals_cents: i64,
    final_cash_cents: Option<i64>,
    conferred_credit_cents: Option<i64>,
    conferred_debit_cents: Option<i64>,
    conferred_pix_cents: Option<i64>,
    conferred_other_cents: Option<i64>,
    closed_at: Option<DateTime<Utc>>,
    closed_by: Option<String>,
}

impl TryFrom<SessionRow> for RegisterSession {
    type Error = DbError;

    fn try_from(row: SessionRow) -> DbResult<Self> {
        let cents = |c: Option<i64>| Money::from_cents(c.unwrap_or(0));

        let counted = match (row.status, row.final_cash_cents, row.closed_at) {
            (SessionStatus::Open, _, _) => None,
            (SessionStatus::Closed, Some(final_cash), Some(closed_at)) => Some(CountedTotals {
                final_cash: Money::from_cents(final_cash),
                conferred: ConferredTotals {
                    credit: cents(row.conferred_credit_cents),
                    debit: cents(row.conferred_debit_cents),
                    pix: cents(row.conferred_pix_cents),
                    other: cents(row.conferred_other_cents),
                },
                closed_at,
                closed_by: row.closed_by.unwrap_or_default(),
            }),
            (SessionStatus::Closed, _, _) => {
                return Err(DbError::Internal(format!(
                    "closed register session {} has no counted totals",
                    row.id
                )))
            }
        };

        Ok(RegisterSession {
            id: row.id,
            till_id: row.till_id,
            opened_at: row.opened_at,
            opened_by: row.opened_by,
            initial_float: Money::from_cents(row.initial_float_cents),
            registered: PaymentTotals {
                cash: Money::from_cents(row.registered_cash_cents),
                credit: Money::from_cents(row.registered_credit_cents),
                debit: Money::from_cents(row.registered_debit_cents),
                pix: Money::from_cents(row.registered_pix_cents),
                other: Money::from_cents(row.registered_other_cents),
            },
            insertions: Money::from_cents(row.insertions_cents),
            withdrawals: Money::from_cents(row.withdrawals_cents),
            counted,
        })
    }
}

fn registered_column(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "registered_cash_cents",
        PaymentMethod::Credit => "registered_credit_cents",
        PaymentMethod::Debit => "registered_debit_cents",
        PaymentMethod::Pix => "registered_pix_cents",
        PaymentMethod::Other => "registered_other_cents",
    }
}

fn movement_column(kind: MovementKind) -> &'static str {
    match kind {
        MovementKind::Insertion => "insertions_cents",
        MovementKind::Withdrawal => "withdrawals_cents",
    }
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<RegisterSession>> {
    let sql = format!("{SELECT_SESSION} WHERE id = ?1");
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    row.map(RegisterSession::try_from).transpose()
}

async fn fetch_open_for_till(
    conn: &mut SqliteConnection,
    till_id: &str,
) -> DbResult<Option<RegisterSession>> {
    let sql = format!("{SELECT_SESSION} WHERE till_id = ?1 AND status = 'open'");
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(till_id)
        .fetch_optional(conn)
        .await?;

    row.map(RegisterSession::try_from).transpose()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for register session operations.
#[derive(Debug, Clone)]
pub struct RegisterSessionRepository {
    pool: SqlitePool,
}

impl RegisterSessionRepository {
    /// Creates a new RegisterSessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterSessionRepository { pool }
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Gets a session by ID, failing with `SessionNotFound`.
    pub async fn require(&self, id: &str) -> DbResult<RegisterSession> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(id.to_string()).into())
    }

    /// The till's open session, if any.
    pub async fn find_open_for_till(&self, till_id: &str) -> DbResult<Option<RegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open_for_till(&mut conn, till_id).await
    }

    /// Opens a new session on `till_id`.
    ///
    /// ## Errors
    /// - `CoreError::SessionAlreadyOpen` if the till has an open session,
    ///   including when another request opened one concurrently
    /// - `CoreError::Validation` for a negative float or a bad till id
    pub async fn open(
        &self,
        till_id: &str,
        initial_float: Money,
        opened_by: &str,
    ) -> DbResult<RegisterSession> {
        let session = RegisterSession::open(till_id, initial_float, opened_by, Utc::now())?;

        let mut tx = begin_write(&self.pool).await?;

        if let Some(existing) = fetch_open_for_till(&mut tx, &session.till_id).await? {
            return Err(CoreError::SessionAlreadyOpen {
                till_id: existing.till_id,
                session_id: existing.id,
            }
            .into());
        }

        debug!(id = %session.id, till_id = %session.till_id, "Inserting register session");

        let inserted = sqlx::query(
            r#"
            INSERT INTO register_sessions (
                id, till_id, status, opened_at, opened_by, initial_float_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&session.id)
        .bind(&session.till_id)
        .bind(SessionStatus::Open)
        .bind(session.opened_at)
        .bind(&session.opened_by)
        .bind(session.initial_float.cents())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from);

        match inserted {
            Ok(_) => {}
            Err(err) if err.is_unique_violation_on("register_sessions.till_id") => {
                // Lost the race to a concurrent open
                drop(tx);
                let winner = self.find_open_for_till(&session.till_id).await?;
                return Err(CoreError::SessionAlreadyOpen {
                    till_id: session.till_id,
                    session_id: winner.map(|s| s.id).unwrap_or_default(),
                }
                .into());
            }
            Err(err) => return Err(err),
        }

        tx.commit().await?;

        info!(
            id = %session.id,
            till_id = %session.till_id,
            initial_float = %session.initial_float,
            opened_by = %session.opened_by,
            "Register session opened"
        );

        Ok(session)
    }

    /// Records a manual insertion or withdrawal.
    ///
    /// The movement row and the session aggregate are written together.
    ///
    /// ## Errors
    /// - `CoreError::SessionNotFound`
    /// - `CoreError::SessionClosed` if the session is (or concurrently became) closed
    /// - `CoreError::Validation` for a non-positive amount or missing reason
    pub async fn record_movement(
        &self,
        session_id: &str,
        new_movement: NewMovement,
        recorded_by: &str,
    ) -> DbResult<Movement> {
        let mut tx = begin_write(&self.pool).await?;

        let mut session = fetch_by_id(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        let movement = session.record_movement(new_movement, recorded_by, Utc::now())?;

        movement::insert(&mut tx, &movement)
            .await
            .map_err(|err| closed_if_frozen(err, session_id))?;

        let column = movement_column(movement.kind);
        let sql = format!(
            "UPDATE register_sessions SET {column} = {column} + ?2 WHERE id = ?1 AND status = 'open'"
        );
        let result = sqlx::query(&sql)
            .bind(session_id)
            .bind(movement.amount.cents())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SessionClosed(session_id.to_string()).into());
        }

        tx.commit().await?;

        info!(
            session_id = %session_id,
            movement_id = %movement.id,
            kind = ?movement.kind,
            amount = %movement.amount,
            "Cash movement recorded"
        );

        Ok(movement)
    }

    /// Adds a posted sale payment to the session's registered totals.
    ///
    /// Returns the session as stored after the update.
    pub async fn accrue_sale(
        &self,
        session_id: &str,
        method: PaymentMethod,
        amount: Money,
    ) -> DbResult<RegisterSession> {
        let mut tx = begin_write(&self.pool).await?;

        let mut session = fetch_by_id(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        session.accrue_sale(method, amount)?;

        let column = registered_column(method);
        let sql = format!(
            "UPDATE register_sessions SET {column} = {column} + ?2 WHERE id = ?1 AND status = 'open'"
        );
        let result = sqlx::query(&sql)
            .bind(session_id)
            .bind(amount.cents())
            .execute(&mut *tx)
            .await
            .map_err(|err| closed_if_frozen(err.into(), session_id))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SessionClosed(session_id.to_string()).into());
        }

        let stored = fetch_by_id(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        tx.commit().await?;

        debug!(session_id = %session_id, method = %method, amount = %amount, "Sale accrued");

        Ok(stored)
    }

    /// Closes a session with the physically counted totals.
    ///
    /// ## Errors
    /// - `CoreError::SessionNotFound`
    /// - `CoreError::SessionAlreadyClosed`; the stored counted values are untouched
    /// - `CoreError::Validation` for negative counted amounts
    pub async fn close(
        &self,
        session_id: &str,
        request: CloseRequest,
        closed_by: &str,
    ) -> DbResult<RegisterSession> {
        let mut tx = begin_write(&self.pool).await?;

        let mut session = fetch_by_id(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        let counted = session.close(request, closed_by, Utc::now())?.clone();

        let result = sqlx::query(
            r#"
            UPDATE register_sessions SET
                status = ?2,
                final_cash_cents = ?3,
                conferred_credit_cents = ?4,
                conferred_debit_cents = ?5,
                conferred_pix_cents = ?6,
                conferred_other_cents = ?7,
                closed_at = ?8,
                closed_by = ?9
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(SessionStatus::Closed)
        .bind(counted.final_cash.cents())
        .bind(counted.conferred.credit.cents())
        .bind(counted.conferred.debit.cents())
        .bind(counted.conferred.pix.cents())
        .bind(counted.conferred.other.cents())
        .bind(counted.closed_at)
        .bind(&counted.closed_by)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SessionAlreadyClosed(session_id.to_string()).into());
        }

        tx.commit().await?;

        info!(
            session_id = %session_id,
            final_cash = %counted.final_cash,
            closed_by = %counted.closed_by,
            "Register session closed"
        );

        Ok(session)
    }

    /// One page of sessions, most recently opened first.
    ///
    /// `till_id = None` lists every till.
    pub async fn list_paginated(
        &self,
        till_id: Option<&str>,
        pagination: Pagination,
    ) -> DbResult<Vec<RegisterSession>> {
        let sql = format!(
            "{SELECT_SESSION} WHERE (?1 IS NULL OR till_id = ?1) \
             ORDER BY opened_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        );
        let rows: Vec<SessionRow> = sqlx::query_as(&sql)
            .bind(till_id)
            .bind(pagination.limit as i64)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(RegisterSession::try_from).collect()
    }

    /// Number of sessions, for page counts.
    pub async fn count(&self, till_id: Option<&str>) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM register_sessions WHERE (?1 IS NULL OR till_id = ?1)",
        )
        .bind(till_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}

/// Takes the write lock at BEGIN; the reads that follow never need a lock
/// upgrade, which SQLite refuses with SQLITE_BUSY under contention.
async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

fn closed_if_frozen(err: DbError, session_id: &str) -> DbError {
    if err.is_frozen_session() {
        CoreError::SessionClosed(session_id.to_string()).into()
    } else {
        err
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use pdv_core::ValidationError;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn movement(kind: MovementKind, amount: i64, reason: &str) -> NewMovement {
        NewMovement {
            kind,
            amount: cents(amount),
            reason: reason.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_and_find() {
        let db = db().await;
        let repo = db.registers();

        let session = repo.open("caixa-01", cents(20000), "ana").await.unwrap();
        assert!(session.is_open());

        let found = repo.find_open_for_till("caixa-01").await.unwrap().unwrap();
        assert_eq!(found, session);
        assert!(repo.find_open_for_till("caixa-02").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_open_on_same_till_conflicts() {
        let db = db().await;
        let repo = db.registers();

        let first = repo.open("caixa-01", cents(0), "ana").await.unwrap();
        let err = repo.open("caixa-01", cents(500), "bia").await.unwrap_err();

        match err {
            DbError::Core(CoreError::SessionAlreadyOpen { till_id, session_id }) => {
                assert_eq!(till_id, "caixa-01");
                assert_eq!(session_id, first.id);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Another till is independent
        repo.open("caixa-02", cents(0), "bia").await.unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_negative_float() {
        let db = db().await;
        let err = db.registers().open("caixa-01", cents(-1), "ana").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
        assert!(db.registers().find_open_for_till("caixa-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_movements_persist_with_aggregates() {
        let db = db().await;
        let repo = db.registers();
        let session = repo.open("caixa-01", cents(20000), "ana").await.unwrap();

        repo.record_movement(&session.id, movement(MovementKind::Insertion, 5000, "reforço"), "ana")
            .await
            .unwrap();
        repo.record_movement(&session.id, movement(MovementKind::Withdrawal, 2000, "sangria"), "ana")
            .await
            .unwrap();

        let stored = repo.require(&session.id).await.unwrap();
        assert_eq!(stored.insertions, cents(5000));
        assert_eq!(stored.withdrawals, cents(2000));

        let movements = db.movements().list_for_session(&session.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].kind, MovementKind::Insertion);
        assert_eq!(movements[1].reason, "sangria");

    }

    #[tokio::test]
    async fn test_invalid_movement_writes_nothing() {
        let db = db().await;
        let repo = db.registers();
        let session = repo.open("caixa-01", cents(0), "ana").await.unwrap();

        let err = repo
            .record_movement(&session.id, movement(MovementKind::Insertion, 0, "zero"), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = repo
            .record_movement(&session.id, movement(MovementKind::Withdrawal, 100, "   "), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        assert!(db.movements().list_for_session(&session.id).await.unwrap().is_empty());
        assert_eq!(repo.require(&session.id).await.unwrap().withdrawals, Money::zero());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let db = db().await;
        let repo = db.registers();

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        let err = repo
            .record_movement("missing", movement(MovementKind::Insertion, 100, "x"), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SessionNotFound(_))));

        let err = repo
            .close("missing", CloseRequest::default(), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_accrue_sale() {
        let db = db().await;
        let repo = db.registers();
        let session = repo.open("caixa-01", cents(0), "ana").await.unwrap();

        repo.accrue_sale(&session.id, PaymentMethod::Pix, cents(1500)).await.unwrap();
        let stored = repo
            .accrue_sale(&session.id, PaymentMethod::Pix, cents(500))
            .await
            .unwrap();

        assert_eq!(stored.registered.pix, cents(2000));
        assert_eq!(stored.registered.total(), cents(2000));
    }

    #[tokio::test]
    async fn test_close_then_reject_everything() {
        let db = db().await;
        let repo = db.registers();
        let session = repo.open("caixa-01", cents(20000), "ana").await.unwrap();
        repo.accrue_sale(&session.id, PaymentMethod::Cash, cents(50000)).await.unwrap();

        let closed = repo
            .close(
                &session.id,
                CloseRequest {
                    final_cash: cents(70000),
                    conferred_pix: Some(cents(300)),
                    ..Default::default()
                },
                "bia",
            )
            .await
            .unwrap();
        assert!(!closed.is_open());

        let stored = repo.require(&session.id).await.unwrap();
        assert_eq!(stored, closed);
        let counted = stored.counted.as_ref().unwrap();
        assert_eq!(counted.final_cash, cents(70000));
        assert_eq!(counted.conferred.pix, cents(300));
        assert_eq!(counted.conferred.credit, Money::zero());
        assert_eq!(counted.closed_by, "bia");

        // Second close keeps the first counted values
        let err = repo
            .close(
                &session.id,
                CloseRequest {
                    final_cash: cents(1),
                    ..Default::default()
                },
                "caio",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SessionAlreadyClosed(_))));
        assert_eq!(repo.require(&session.id).await.unwrap(), stored);

        let err = repo
            .record_movement(&session.id, movement(MovementKind::Withdrawal, 100, "late"), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SessionClosed(_))));

        let err = repo
            .accrue_sale(&session.id, PaymentMethod::Cash, cents(100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SessionClosed(_))));

        // Till is free again
        assert!(repo.find_open_for_till("caixa-01").await.unwrap().is_none());
        repo.open("caixa-01", cents(0), "ana").await.unwrap();
    }

    #[tokio::test]
    async fn test_schema_freezes_closed_sessions() {
        let db = db().await;
        let repo = db.registers();
        let session = repo.open("caixa-01", cents(0), "ana").await.unwrap();
        repo.close(&session.id, CloseRequest::default(), "ana").await.unwrap();

        let raw = sqlx::query("UPDATE register_sessions SET final_cash_cents = 1 WHERE id = ?1")
            .bind(&session.id)
            .execute(db.pool())
            .await;
        let err = DbError::from(raw.unwrap_err());
        assert!(err.is_frozen_session());
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_paginated() {
        let db = db().await;
        let repo = db.registers();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let s = repo.open("caixa-01", cents(0), "ana").await.unwrap();
            repo.close(&s.id, CloseRequest::default(), "ana").await.unwrap();
            ids.push(s.id);
        }
        repo.open("caixa-02", cents(0), "bia").await.unwrap();

        assert_eq!(repo.count(None).await.unwrap(), 4);
        assert_eq!(repo.count(Some("caixa-01")).await.unwrap(), 3);

        let page1 = repo
            .list_paginated(Some("caixa-01"), Pagination::new(Some(1), Some(2)).unwrap())
            .await
            .unwrap();
        let page2 = repo
            .list_paginated(Some("caixa-01"), Pagination::new(Some(2), Some(2)).unwrap())
            .await
            .unwrap();

        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 1);
        assert_eq!(page1[0].id, ids[2]);
        assert_eq!(page1[1].id, ids[1]);
        assert_eq!(page2[0].id, ids[0]);

        let all = repo.list_paginated(None, Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].till_id, "caixa-02");
    }

    // -------------------------------------------------------------------------
    // Concurrent writers (file-backed pool, several connections)
    // -------------------------------------------------------------------------

    async fn file_db(dir: &tempfile::TempDir) -> Database {
        Database::new(DbConfig::new(dir.path().join("caixa.db")).max_connections(8))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_and_movements_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let session = db.registers().open("caixa-01", cents(0), "ana").await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..40 {
            let db = db.clone();
            let id = session.id.clone();
            tasks.push(tokio::spawn(async move {
                let repo = db.registers();
                if i % 2 == 0 {
                    repo.accrue_sale(&id, PaymentMethod::Cash, cents(100))
                        .await
                        .map(|_| ())
                } else {
                    repo.record_movement(&id, movement(MovementKind::Insertion, 10, "troco"), "ana")
                        .await
                        .map(|_| ())
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = db.registers().require(&session.id).await.unwrap();
        assert_eq!(stored.registered.cash, cents(2000));
        assert_eq!(stored.insertions, cents(200));
        let movements = db.movements().list_for_session(&session.id).await.unwrap();
        assert_eq!(movements.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_closes_have_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let session = db.registers().open("caixa-01", cents(1000), "ana").await.unwrap();

        let mut tasks = Vec::new();
        for i in 1..=8i64 {
            let db = db.clone();
            let id = session.id.clone();
            tasks.push(tokio::spawn(async move {
                let request = CloseRequest {
                    final_cash: cents(i * 100),
                    ..Default::default()
                };
                db.registers().close(&id, request, "ana").await
            }));
        }

        let mut winners = Vec::new();
        for task in tasks {
            match task.await.unwrap() {
                Ok(closed) => winners.push(closed),
                Err(DbError::Core(CoreError::SessionAlreadyClosed(_))) => {}
                Err(other) => panic!("unexpected close error: {other}"),
            }
        }

        assert_eq!(winners.len(), 1);
        let stored = db.registers().require(&session.id).await.unwrap();
        assert_eq!(stored.counted, winners[0].counted);
    }
}
