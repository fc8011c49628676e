//! JSON bodies of the `/api` endpoints, shared by the server and [`crate::client`].

use crate::db::models::{NewUser, SessionUser, UserId};
use crate::error::SiteError;
use serde::{Deserialize, Serialize};

/// Fields are optional so a missing field surfaces as a 400 naming it,
/// rather than a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupInput {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            email: self.email,
            username: self.username,
            password_hash,
        }
    }
}

impl SignupRequest {
    pub fn validate(self) -> Result<SignupInput, SiteError> {
        Ok(SignupInput {
            username: required_trimmed(self.username, "username")?,
            email: required_trimmed(self.email, "email")?,
            password: required(self.password, "password")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<LoginInput, SiteError> {
        Ok(LoginInput {
            email: required_trimmed(self.email, "email")?,
            password: required(self.password, "password")?,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SiteError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SiteError::MissingField(field)),
    }
}

fn required_trimmed(value: Option<String>, field: &'static str) -> Result<String, SiteError> {
    required(value.map(|v| v.trim().to_string()), field)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub logged_in: bool,
    pub username: String,
    pub email: String,
}

impl LoginResponse {
    pub fn success(user: &SessionUser) -> Self {
        Self {
            message: "Login successful!".to_string(),
            logged_in: true,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// `{loggedIn:false}` or `{loggedIn:true, username, email}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionStatus {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn logged_in(user: &SessionUser) -> Self {
        Self {
            logged_in: true,
            username: Some(user.username.clone()),
            email: Some(user.email.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
