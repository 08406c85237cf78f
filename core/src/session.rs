//! Credentials and the per-client session context.
//!
//! # Design
//! Everything the remote service expects on every call is derived exactly once,
//! when the `SessionContext` is built: the `cloud_key` header, the
//! `Authorization` token (raw base64 of `username:password`, no `Basic `
//! prefix), and the `session_id`, a client-generated stamp of the local
//! date and hour. The context is immutable afterwards and is shared by
//! reference with every request builder.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Local, NaiveDateTime};

use crate::error::ApiError;

/// Base URL of the hosted subscriber service.
pub const DEFAULT_BASE_URL: &str = "http://baiboss.cloudapp.net:47081/baicellsapi";

pub const ENV_USERNAME: &str = "BOSS_USERNAME";
pub const ENV_PASSWORD: &str = "BOSS_PASSWORD";
pub const ENV_CLOUD_KEY: &str = "BOSS_CLOUD_KEY";
pub const ENV_BASE_URL: &str = "BOSS_BASE_URL";

/// Account credentials plus the tenant key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub cloud_key: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str, cloud_key: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            cloud_key: cloud_key.to_string(),
        }
    }

    /// Read credentials from `BOSS_USERNAME`, `BOSS_PASSWORD` and `BOSS_CLOUD_KEY`.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            username: required_env(ENV_USERNAME)?,
            password: required_env(ENV_PASSWORD)?,
            cloud_key: required_env(ENV_CLOUD_KEY)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cloud_key", &"<redacted>")
            .finish()
    }
}

/// `BOSS_BASE_URL` if set, otherwise [`DEFAULT_BASE_URL`].
pub fn base_url_from_env() -> String {
    std::env::var(ENV_BASE_URL)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

fn required_env(name: &str) -> Result<String, ApiError> {
    std::env::var(name).map_err(|_| ApiError::ConfigError(format!("{name} is not set")))
}

/// Immutable header and session state shared by every request.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    base_url: String,
    cloud_key: String,
    authorization: String,
    session_id: String,
}

impl SessionContext {
    /// Build a context stamped with the current local hour.
    pub fn new(credentials: &Credentials, base_url: &str) -> Self {
        Self::at(credentials, base_url, Local::now().naive_local())
    }

    /// Build a context stamped with the hour of `now`.
    pub fn at(credentials: &Credentials, base_url: &str, now: NaiveDateTime) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cloud_key: credentials.cloud_key.clone(),
            authorization: authorization_token(&credentials.username, &credentials.password),
            session_id: session_id_at(now),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cloud_key(&self) -> &str {
        &self.cloud_key
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Absolute URL for an endpoint path such as `customers/query`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// The two headers every request carries.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("cloud_key".to_string(), self.cloud_key.clone()),
            ("Authorization".to_string(), self.authorization.clone()),
        ]
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("base_url", &self.base_url)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// Base64 of `username:password`, sent verbatim as the `Authorization` value.
pub fn authorization_token(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

/// `YYYYMMDDHH` for the given local time.
pub fn session_id_at(now: NaiveDateTime) -> String {
    now.format("%Y%m%d%H").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 22, 0)
            .unwrap()
    }

    #[test]
    fn authorization_is_raw_base64_of_user_colon_password() {
        assert_eq!(authorization_token("u", "p"), STANDARD.encode("u:p"));
        assert_eq!(authorization_token("u", "p"), "dTpw");
        assert_eq!(authorization_token("admin", "secret"), "YWRtaW46c2VjcmV0");
    }

    #[test]
    fn session_id_has_hour_granularity() {
        assert_eq!(session_id_at(clock()), "2024031514");
    }

    #[test]
    fn session_id_zero_pads_month_day_and_hour() {
        let early = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 59, 59)
            .unwrap();
        assert_eq!(session_id_at(early), "2025010203");
    }

    #[test]
    fn context_derives_headers_once() {
        let creds = Credentials::new("u", "p", "tenant-key");
        let ctx = SessionContext::at(&creds, DEFAULT_BASE_URL, clock());
        assert_eq!(ctx.session_id(), "2024031514");
        assert_eq!(
            ctx.headers(),
            vec![
                ("cloud_key".to_string(), "tenant-key".to_string()),
                ("Authorization".to_string(), "dTpw".to_string()),
            ]
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let creds = Credentials::new("u", "p", "k");
        let ctx = SessionContext::at(&creds, "http://localhost:3000/baicellsapi/", clock());
        assert_eq!(ctx.url("customers/query"), "http://localhost:3000/baicellsapi/customers/query");
    }

    // The only test touching BOSS_* variables, so no other test races it.
    #[test]
    fn environment_configuration() {
        std::env::set_var(ENV_USERNAME, "env-user");
        std::env::set_var(ENV_PASSWORD, "env-pass");
        std::env::set_var(ENV_CLOUD_KEY, "env-key");
        std::env::set_var(ENV_BASE_URL, "http://boss.internal/baicellsapi");
        assert_eq!(
            Credentials::from_env().unwrap(),
            Credentials::new("env-user", "env-pass", "env-key")
        );
        assert_eq!(base_url_from_env(), "http://boss.internal/baicellsapi");

        std::env::remove_var(ENV_PASSWORD);
        std::env::remove_var(ENV_BASE_URL);
        let err = Credentials::from_env().unwrap_err();
        assert!(matches!(err, ApiError::ConfigError(ref m) if m.contains(ENV_PASSWORD)));
        assert_eq!(base_url_from_env(), DEFAULT_BASE_URL);

        std::env::remove_var(ENV_USERNAME);
        std::env::remove_var(ENV_CLOUD_KEY);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::new("u", "hunter2", "tenant-key");
        let ctx = SessionContext::at(&creds, DEFAULT_BASE_URL, clock());
        let rendered = format!("{creds:?} {ctx:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("tenant-key"));
        assert!(!rendered.contains(ctx.authorization()));
    }
}
