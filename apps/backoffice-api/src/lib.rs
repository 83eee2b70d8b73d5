//! # PDV Back-Office API
//!
//! HTTP server for the caixa (cash register) back-office: operators log in,
//! open a till, record cash movements, close with counted totals, and browse
//! the reconciliation history.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Back-Office API                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌──────────────────────┐  ┌────────────────────┐  │
//! │  │  auth          │  │  caixa               │  │  health            │  │
//! │  │                │  │                      │  │                    │  │
//! │  │ • login        │  │ • open               │  │ • liveness + DB    │  │
//! │  │ • whoami       │  │ • movements (+list)  │  │                    │  │
//! │  │   (optional)   │  │ • sales              │  │                    │  │
//! │  │                │  │ • close              │  │                    │  │
//! │  │                │  │ • status / history   │  │                    │  │
//! │  └────────────────┘  └──────────────────────┘  └────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────┐│  │
//! │  │  │  pdv-db      │  │  pdv-core        │  │  JWT guard           ││  │
//! │  │  │  SQLite      │  │  reconciliation  │  │  Operator /          ││  │
//! │  │  │  repositories│  │  + view DTOs     │  │  MaybeOperator       ││  │
//! │  │  └──────────────┘  └──────────────────┘  └──────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is read in development):
//! - `PDV_BIND_ADDR` / `PDV_PORT` - listen address (default: 0.0.0.0:8080)
//! - `PDV_DATABASE_PATH` - SQLite file (default: ./pdv.db)
//! - `PDV_TILL_ID` - till served by default (default: caixa-01)
//! - `PDV_JWT_SECRET` - HS256 signing secret
//! - `PDV_JWT_ACCESS_LIFETIME_SECS` - access token lifetime (default: 28800)
//! - `PDV_DEFICIT_SEVERITY` / `PDV_SURPLUS_SEVERITY` - ok | warning | critical
//! - `PDV_ADMIN_USERNAME` / `PDV_ADMIN_PASSWORD` - first operator

pub mod api_types;
pub mod auth;
pub mod config;
pub mod error;
mod handlers;
pub mod routes;

use pdv_db::Database;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState { db, config, jwt }
    }
}
