use axum_extra::extract::cookie::SameSite;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "PORTFOLIO_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub session: SessionConfig,
    pub throttle: ThrottleConfig,
    pub runner: RunnerConfig,
}

impl Config {
    /// Defaults, then `config.toml` if present, then `PORTFOLIO_*` env vars.
    /// Nested keys use `__`, e.g. `PORTFOLIO_SESSION__COOKIE_SECURE=true`.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Master secret for the private cookie key. Must be at least 64 bytes;
    /// left empty, a random key is generated and sessions do not survive restarts.
    pub session_secret: String,
    /// Include internal error detail in 500 responses. Development only.
    pub expose_error_detail: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            database_url: "sqlite:portfolio.sqlite".to_string(),
            loglevel: "info".to_string(),
            session_secret: String::new(),
            expose_error_detail: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(value: SameSitePolicy) -> Self {
        match value {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub same_site: SameSitePolicy,
    pub ttl_hours: u32,
    pub purge_interval_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.ttl_hours.max(1)))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }

    /// Browsers drop `SameSite=None` cookies that are not also `Secure`.
    pub fn validate(&self) -> Result<(), String> {
        if self.same_site == SameSitePolicy::None && !self.cookie_secure {
            return Err("session.same_site = \"none\" requires session.cookie_secure = true".into());
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "portfolio.sid".to_string(),
            cookie_secure: false,
            same_site: SameSitePolicy::Lax,
            ttl_hours: 24,
            purge_interval_secs: 600,
        }
    }
}

/// Global request throttling. `requests_per_minute = 0` disables it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Packages bundled with the interpreter, loaded once on first use.
    pub packages: Vec<String>,
    /// Packages fetched through the interpreter's own installer after loading.
    pub extra_packages: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            packages: ["micropip", "matplotlib", "numpy", "pandas"]
                .into_iter()
                .map(String::from)
                .collect(),
            extra_packages: vec!["seaborn".to_string()],
        }
    }
}
