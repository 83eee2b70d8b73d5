//! # pdv-db: Database Layer for the PDV Back-Office
//!
//! SQLite persistence for caixa sessions, cash movements and operators,
//! using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PDV Back-Office Data Flow                          │
//! │                                                                         │
//! │  HTTP request (POST /v1/caixa/{id}/close)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pdv-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐    ┌─────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │    │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │    │ (embedded)  │  │   │
//! │  │   │               │    │ RegisterSession │    │             │  │   │
//! │  │   │ SqlitePool    │◄───│ Movement        │    │ 0001_…sql   │  │   │
//! │  │   │ WAL + FKs     │    │ Operator        │    │             │  │   │
//! │  │   └───────────────┘    └─────────────────┘    └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (pdv.db)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pdv_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./pdv.db")).await?;
//! let session = db.registers().open("caixa-01", Money::from_cents(20000), "ana").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    MovementRepository, OperatorRecord, OperatorRepository, RegisterSessionRepository,
};
