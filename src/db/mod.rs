//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: queries over a `SqlitePool`

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbSession, DbUser, NewUser, SessionUser};
pub use schema::SQLITE_INIT;
pub use sqlite::{SiteStorage, SqlitePool};
