//! Registered processes, descriptor schemas, users and permission grants are stored in a SQLite
//! database

use chrono::Utc;
use thiserror::Error;

/// Connect to a SQLite database
pub mod open;
/// Users and groups that permissions are granted to
pub mod user;
pub mod permission;
pub mod process;
pub mod descriptor;
/// Version-aware insert or update shared by processes and descriptor schemas
pub mod upsert;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("can't (de)serialise JSON column: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected value '{value}' in column {column}")]
    Column { column: &'static str, value: String },
}

/// Timestamp format used for every date column, sorts lexically
pub(crate) fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
