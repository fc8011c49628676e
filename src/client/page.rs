use super::api::SiteClient;
use super::ui::{Banner, HeaderDisplay};
use crate::types::auth::SessionStatus;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

pub const LOGIN_PAGE: &str = "/login.html";

/// Any `/api` reply body; success and error shapes both fit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    logged_in: bool,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl ReplyBody {
    fn message_or(self, fallback: &str) -> String {
        self.message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// State of a page carrying the auth header, login and signup forms.
/// Network and parse failures end up in `banner`; nothing here panics.
pub struct AuthPage {
    client: SiteClient,
    pub header: HeaderDisplay,
    pub banner: Option<Banner>,
    /// Set when the page should navigate away.
    pub redirect: Option<String>,
}

impl AuthPage {
    pub fn new(client: SiteClient) -> Self {
        Self {
            client,
            header: HeaderDisplay::logged_out(),
            banner: None,
            redirect: None,
        }
    }

    /// Page load: sync the header with the server session.
    pub async fn load(&mut self) {
        self.header = match self.client.session().await {
            Ok(status) => HeaderDisplay::from_status(&status),
            Err(e) => {
                warn!(error = %e, "session check failed");
                HeaderDisplay::logged_out()
            }
        };
    }

    pub async fn submit_login(&mut self, email: &str, password: &str) {
        match self.client.login::<ReplyBody>(email, password).await {
            Ok(reply) if reply.is_success() => {
                let body = reply.body;
                self.header = HeaderDisplay::from_status(&SessionStatus {
                    logged_in: body.logged_in,
                    username: body.username,
                    email: body.email,
                });
                self.banner = Some(Banner::success("Login successful!"));
            }
            Ok(reply) => {
                self.banner = Some(Banner::error(
                    reply.body.message_or("Invalid email or password."),
                ));
                self.header = HeaderDisplay::logged_out();
            }
            Err(e) => {
                warn!(error = %e, "login request failed");
                self.banner = Some(Banner::error(
                    "An unexpected error occurred. Please try again.",
                ));
            }
        }
    }

    pub async fn submit_signup(&mut self, username: &str, email: &str, password: &str) {
        match self
            .client
            .signup::<ReplyBody>(username, email, password)
            .await
        {
            Ok(reply) if reply.status == StatusCode::CREATED => {
                self.banner = Some(Banner::success(
                    "Signup successful! Redirecting to login...",
                ));
                self.redirect = Some(LOGIN_PAGE.to_string());
            }
            Ok(reply) => {
                self.banner = Some(Banner::error(
                    reply.body.message_or("Signup failed. Please try again."),
                ));
            }
            Err(e) => {
                warn!(error = %e, "signup request failed");
                self.banner = Some(Banner::error("An unexpected network error occurred."));
            }
        }
    }

    /// Checks the session first so a second logout is a notice, not an error.
    pub async fn logout(&mut self) {
        let status = match self.client.session().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "logout failed");
                self.banner = Some(Banner::error(
                    "An unexpected error occurred during logout.",
                ));
                return;
            }
        };
        if !status.logged_in {
            self.banner = Some(Banner::info("You are already logged out."));
            self.header = HeaderDisplay::logged_out();
            return;
        }

        match self.client.logout::<ReplyBody>().await {
            Ok(reply) if reply.is_success() => {
                self.banner = Some(Banner::success(
                    "You have been successfully logged out.",
                ));
                self.header = HeaderDisplay::logged_out();
            }
            Ok(_) => {
                self.banner = Some(Banner::error("Logout failed. Please try again."));
            }
            Err(e) => {
                warn!(error = %e, "logout failed");
                self.banner = Some(Banner::error(
                    "An unexpected error occurred during logout.",
                ));
            }
        }
    }
}
