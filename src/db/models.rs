use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i64;

/// A stored user. `password_hash` never leaves the server.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Public identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
}

impl From<&DbUser> for SessionUser {
    fn from(u: &DbUser) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            username: u.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbSession {
    pub id: String,
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl DbSession {
    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.user_id,
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
