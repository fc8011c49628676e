use crate::db::models::{DbSession, DbUser, NewUser, SessionUser, UserId};
use crate::db::schema::SQLITE_INIT;
use crate::error::SiteError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;

pub type SqlitePool = Pool<Sqlite>;

/// Fixed-width UTC timestamps so `expires_at` compares correctly as TEXT.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, SiteError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc))
}

#[derive(Clone)]
pub struct SiteStorage {
    pool: SqlitePool,
}

impl SiteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, SiteError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // In-memory databases are per-connection; keep exactly one alive.
        let pool_opts = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_opts.connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), SiteError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a user. A duplicate email or username yields `SiteError::Conflict`.
    pub async fn insert_user(&self, user: NewUser) -> Result<UserId, SiteError> {
        let res = sqlx::query(
            r#"INSERT INTO users (email, username, password_hash, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(user.email)
        .bind(user.username)
        .bind(user.password_hash)
        .bind(ts(Utc::now()))
        .execute(&self.pool)
        .await;

        match res {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(SiteError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, SiteError> {
        let row = sqlx::query(
            r#"SELECT id, email, username, password_hash, created_at
               FROM users WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn count_users(&self) -> Result<i64, SiteError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn insert_session(
        &self,
        id: &str,
        user: &SessionUser,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SiteError> {
        sqlx::query(
            r#"INSERT INTO sessions (id, user_id, email, username, expires_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(id)
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(ts(expires_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a session that has not expired as of `now`.
    pub async fn get_session(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DbSession>, SiteError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, email, username, expires_at
               FROM sessions WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let session = row.map(Self::row_to_session).transpose()?;
        Ok(session.filter(|s| !s.is_expired(now)))
    }

    /// Returns whether a row was removed. Missing ids are not an error.
    pub async fn delete_session(&self, id: &str) -> Result<bool, SiteError> {
        let done = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, SiteError> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(ts(now))
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    fn row_to_user(row: SqliteRow) -> Result<DbUser, SiteError> {
        let created_at: String = row.try_get("created_at")?;
        Ok(DbUser {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_ts(&created_at)?,
        })
    }

    fn row_to_session(row: SqliteRow) -> Result<DbSession, SiteError> {
        let expires_at: String = row.try_get("expires_at")?;
        Ok(DbSession {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            expires_at: parse_ts(&expires_at)?,
        })
    }
}
