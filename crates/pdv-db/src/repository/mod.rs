//! # Repository Module
//!
//! Database repository implementations for the back-office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.registers().close(&id, request, &operator)                 │
//! │       ▼                                                                 │
//! │  RegisterSessionRepository                                             │
//! │  ├── open / close / record_movement / accrue_sale                      │
//! │  ├── get_by_id / find_open_for_till                                    │
//! │  └── list_paginated / count                                            │
//! │       │                                                                 │
//! │       │  load row ─► pdv-core transition ─► guarded UPDATE             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RegisterSessionRepository`] - Caixa sessions and their transitions
//! - [`MovementRepository`] - Manual cash movement reads
//! - [`OperatorRepository`] - Operator accounts for login

pub mod movement;
pub mod operator;
pub mod register;

pub use movement::MovementRepository;
pub use operator::{OperatorRecord, OperatorRepository};
pub use register::RegisterSessionRepository;
