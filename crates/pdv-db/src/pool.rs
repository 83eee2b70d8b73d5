//! # Pool & Handle
//!
//! Opens the SQLite file the caixa data lives in and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig ──► Database::new ──► SqlitePool (WAL, FK on) ──► MIGRATOR   │
//! │                    │                                                    │
//! │                    ├─► registers()  register_sessions (+ movements tx)  │
//! │                    ├─► movements()  movements (read side)               │
//! │                    └─► operators()  operators                           │
//! │                                                                         │
//! │  Handlers run concurrently; each repository call checks out its own    │
//! │  connection, and every write is a single short transaction.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets status and history reads proceed while a close is committing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::movement::MovementRepository;
use crate::repository::operator::OperatorRepository;
use crate::repository::register::RegisterSessionRepository;

const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings for [`Database::new`].
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./pdv.db").max_connections(8)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Pool ceiling. Default: 5
    pub max_connections: u32,

    /// Connections kept warm. Default: 1
    pub min_connections: u32,

    /// How long a request waits for a free connection. Default: 30s
    pub connect_timeout: Duration,

    /// How long a writer waits for another writer's lock before SQLite
    /// reports "database is locked". Default: 5s
    pub busy_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections
    /// for the life of the pool.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Apply embedded migrations before returning. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Settings for a file-backed database; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private in-memory database per pool. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            // Every connection to :memory: is a separate database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the caixa database.
///
/// Cheap to clone; the HTTP layer keeps one in its shared state and every
/// handler asks it for the repository it needs.
///
/// ```rust,ignore
/// async fn status(State(state): State<AppState>) -> ApiResult<Json<SessionView>> {
///     let session = state.db.registers().find_open_for_till(&till).await?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database, builds the pool and applies
    /// migrations when `config.run_migrations` is set.
    ///
    /// Every connection runs with `journal_mode=WAL`, `synchronous=NORMAL`,
    /// `foreign_keys=ON` and the configured `busy_timeout`; the movement →
    /// session foreign key depends on `foreign_keys`.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening caixa database"
        );

        let connect_url = if config.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", config.database_path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!(in_memory = config.is_in_memory(), "SQLite options ready");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout);

        if config.is_in_memory() {
            // Recycling the only connection would drop the database with it
            pool_options = pool_options.max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Caixa database pool ready"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies any pending embedded migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the register session repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let open = db.registers().find_open_for_till("caixa-01").await?;
    /// ```
    pub fn registers(&self) -> RegisterSessionRepository {
        RegisterSessionRepository::new(self.pool.clone())
    }

    /// Returns the movement repository.
    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.pool.clone())
    }

    /// Returns the operator repository.
    pub fn operators(&self) -> OperatorRepository {
        OperatorRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and shuts the pool. Repository
    /// calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing caixa database");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
