use crate::db::models::{DbUser, SessionUser};
use crate::error::SiteError;
use crate::middleware::payload::ApiPayload;
use crate::middleware::session::SessionCookie;
use crate::router::SiteState;
use crate::service::password::{hash_password_blocking, verify_password_blocking};
use crate::types::auth::{
    LoginRequest, LoginResponse, MessageResponse, SessionStatus, SignupRequest, SignupResponse,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

const SIGNUP_FAILED: &str = "An error occurred during registration.";
const LOGIN_FAILED: &str = "An error occurred during login.";

/// GET /api/session -> public identity of the current session, if any.
pub async fn session_status(
    State(state): State<SiteState>,
    cookie: SessionCookie,
) -> Result<Response, SiteError> {
    let Some(id) = cookie.id.as_deref() else {
        return Ok(Json(SessionStatus::logged_out()).into_response());
    };

    match state.store.get_session(id).await? {
        Some(user) => Ok(Json(SessionStatus::logged_in(&user)).into_response()),
        None => {
            debug!("stale session cookie; clearing");
            let jar = cookie.clear(&state.session);
            Ok((jar, Json(SessionStatus::logged_out())).into_response())
        }
    }
}

/// POST /api/signup -> create a user with a hashed password.
pub async fn signup(
    State(state): State<SiteState>,
    ApiPayload(req): ApiPayload<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), SiteError> {
    let input = req.validate()?;

    let password_hash = hash_password_blocking(input.password.clone())
        .await
        .map_err(SiteError::during(SIGNUP_FAILED))?;
    let user_id = state
        .store
        .create_user(input.into_new_user(password_hash))
        .await
        .inspect_err(|e| {
            if matches!(e, SiteError::Conflict) {
                info!("signup rejected: email or username already in use");
            }
        })
        .map_err(SiteError::during(SIGNUP_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Registration successful!".to_string(),
            user_id,
        }),
    ))
}

/// POST /api/login -> verify credentials and start a fresh session.
pub async fn login(
    State(state): State<SiteState>,
    cookie: SessionCookie,
    ApiPayload(req): ApiPayload<LoginRequest>,
) -> Result<Response, SiteError> {
    let input = req.validate()?;

    let user = authenticate(&state, input.email, input.password)
        .await
        .map_err(SiteError::during(LOGIN_FAILED))?;

    // A login always gets a new id; whatever the client carried is dropped.
    if let Some(old) = cookie.id.as_deref()
        && let Err(e) = state.store.delete_session(old).await
    {
        warn!(error = %e, "failed to drop previous session on login");
    }

    let issued = state
        .store
        .create_session(user.clone())
        .await
        .map_err(SiteError::during(LOGIN_FAILED))?;
    info!(user_id = user.id, "login succeeded");

    let jar = cookie.set(&state.session, issued.id);
    Ok((jar, Json(LoginResponse::success(&user))).into_response())
}

/// Unknown email and wrong password are indistinguishable to the caller,
/// in both message and timing: every attempt runs exactly one verification.
async fn authenticate(
    state: &SiteState,
    email: String,
    password: String,
) -> Result<SessionUser, SiteError> {
    let user = state.store.find_user_by_email(&email).await?;
    let stored = hash_to_verify(user.as_ref(), &state.login_decoy).to_string();
    let matched = verify_password_blocking(password, stored).await?;
    match user {
        Some(user) if matched => Ok(SessionUser::from(&user)),
        Some(user) => {
            debug!(user_id = user.id, "login failed: password mismatch");
            Err(SiteError::InvalidCredentials)
        }
        None => {
            debug!("login failed: unknown email");
            Err(SiteError::InvalidCredentials)
        }
    }
}

fn hash_to_verify<'a>(user: Option<&'a DbUser>, decoy: &'a str) -> &'a str {
    user.map_or(decoy, |u| u.password_hash.as_str())
}

/// POST /api/logout -> destroy the session (if any) and clear the cookie.
pub async fn logout(
    State(state): State<SiteState>,
    cookie: SessionCookie,
) -> Result<Response, SiteError> {
    if let Some(id) = cookie.id.as_deref() {
        state
            .store
            .delete_session(id)
            .await
            .map_err(SiteError::during("Could not log out."))?;
    }
    let jar = cookie.clear(&state.session);
    Ok((jar, Json(MessageResponse::new("Logged out successfully."))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::password::{decoy_hash, hash_password};
    use chrono::Utc;

    #[test]
    fn unknown_email_is_verified_against_the_decoy() {
        let decoy = decoy_hash().unwrap();
        assert_eq!(hash_to_verify(None, &decoy), decoy);

        let user = DbUser {
            id: 1,
            email: "a@x.com".into(),
            username: "a".into(),
            password_hash: hash_password("p").unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(hash_to_verify(Some(&user), &decoy), user.password_hash);
    }
}
