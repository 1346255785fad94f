//! Porter API - REST API Layer
//!
//! This crate provides the HTTP layer for the Porter backend: support
//! tickets with threaded messaging and a daily habit-compliance tracker.
//! It exposes REST endpoints (Axum) over a PostgreSQL store reached
//! through a deadpool connection pool; all identity and ownership rules
//! come from porter-core.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode, ErrorResponse};
pub use extractors::PathTicketRef;
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use types::*;
