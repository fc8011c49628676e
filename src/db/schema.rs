//! SQL DDL for initializing the user and session storage.

/// SQLite schema with:
/// - `users`: unique `email` and unique `username`, Argon2 PHC `password_hash`
/// - `sessions`: opaque token `id`, denormalized public user fields, RFC3339 `expires_at`
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id),
    email TEXT NOT NULL,
    username TEXT NOT NULL,
    expires_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;
