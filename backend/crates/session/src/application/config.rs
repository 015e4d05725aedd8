//! Application Configuration
//!
//! Configuration for the session module. The signing secret is mandatory:
//! there is deliberately no machine-derived fallback, since a host-identity
//! secret breaks silently the moment a second instance appears.

use chrono::Duration;

use crate::error::{SessionError, SessionResult};

/// Scheme name reported to clients alongside minted tokens
pub const TOKEN_TYPE: &str = "Bearer";

/// Session module configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC-SHA256 secret used to sign and verify both token kinds
    pub token_secret: String,
    /// Access token lifetime (default: 1 day)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (default: 90 days)
    pub refresh_token_ttl: Duration,
    /// Issuer used when the request context cannot supply one
    pub issuer: String,
    /// Audience used when the request carries no Origin/Referer
    pub audience: String,
    /// Whether a user may hold several concurrent sessions
    pub allow_multiple_sessions: bool,
    /// Minimum gap between `last_active_at` writes (default: 2 minutes)
    pub last_active_debounce: Duration,
}

/// Default access token lifetime in seconds (1 day).
const DEFAULT_ACCESS_TTL_SECS: i64 = 24 * 3600;
/// Default refresh token lifetime in days.
const DEFAULT_REFRESH_TTL_DAYS: i64 = 90;
/// Default debounce for last-active writes, in seconds.
const DEFAULT_DEBOUNCE_SECS: i64 = 120;

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default            |
    /// |-----------------------------|----------|--------------------|
    /// | `SESSION_TOKEN_SECRET`      | **yes**  | --                 |
    /// | `SESSION_ACCESS_TTL_SECS`   | no       | `86400`            |
    /// | `SESSION_REFRESH_TTL_DAYS`  | no       | `90`               |
    /// | `SESSION_ISSUER`            | no       | `http://localhost` |
    /// | `SESSION_AUDIENCE`          | no       | `localhost`        |
    /// | `SESSION_ALLOW_MULTIPLE`    | no       | `true`             |
    ///
    /// Fails (and startup must fail with it) when the secret is missing or
    /// empty.
    pub fn from_env() -> SessionResult<Self> {
        let token_secret = std::env::var("SESSION_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                SessionError::Config("SESSION_TOKEN_SECRET must be set and non-empty".to_string())
            })?;

        let access_secs = env_i64("SESSION_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_days = env_i64("SESSION_REFRESH_TTL_DAYS", DEFAULT_REFRESH_TTL_DAYS)?;

        let allow_multiple_sessions = match std::env::var("SESSION_ALLOW_MULTIPLE") {
            Ok(v) => v.parse::<bool>().map_err(|_| {
                SessionError::Config(format!("SESSION_ALLOW_MULTIPLE is not a bool: {v:?}"))
            })?,
            Err(_) => true,
        };

        Ok(Self {
            token_secret,
            access_token_ttl: Duration::seconds(access_secs),
            refresh_token_ttl: Duration::days(refresh_days),
            issuer: std::env::var("SESSION_ISSUER")
                .unwrap_or_else(|_| "http://localhost".to_string()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "localhost".to_string()),
            allow_multiple_sessions,
            last_active_debounce: Duration::seconds(DEFAULT_DEBOUNCE_SECS),
        })
    }

    /// Config with explicit secret and defaults for everything else.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            token_secret: secret.into(),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            issuer: "http://localhost".to_string(),
            audience: "localhost".to_string(),
            allow_multiple_sessions: true,
            last_active_debounce: Duration::seconds(DEFAULT_DEBOUNCE_SECS),
        }
    }
}

fn env_i64(name: &str, default: i64) -> SessionResult<i64> {
    match std::env::var(name) {
        Ok(v) => v
            .parse::<i64>()
            .map_err(|_| SessionError::Config(format!("{name} is not an integer: {v:?}"))),
        Err(_) => Ok(default),
    }
}
