//! HTTP handlers, grouped by route prefix.
//!
//! All handlers are `pub(crate)`; `routes::build_router` is the only way in.

pub(crate) mod auth;
pub(crate) mod caixa;
pub(crate) mod health;
