//! Sync configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_GROUP_POLL_MS: u64 = 5_000;
pub const DEFAULT_FEED_POLL_MS: u64 = 2_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be greater than zero")]
    ZeroInterval { var: &'static str },
    #[error("base URL must start with http:// or https://, got {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// API root, without a trailing slash (e.g. `"https://host/api"`).
    pub base_url: String,
    /// Bearer token attached to every request. `None` sends anonymous requests.
    pub access_token: Option<String>,
    pub group_poll_interval: Duration,
    pub feed_poll_interval: Duration,
    pub timeouts: HttpTimeouts,
}

impl SyncConfig {
    /// Build typed config from process environment.
    ///
    /// Optional:
    /// - `GROUPSYNC_BASE_URL`: default `http://127.0.0.1:8000/api`
    /// - `GROUPSYNC_ACCESS_TOKEN`: unset means anonymous
    /// - `GROUPSYNC_GROUP_POLL_MS`: default 5000
    /// - `GROUPSYNC_FEED_POLL_MS`: default 2000
    /// - `GROUPSYNC_REQUEST_TIMEOUT_SECS`: default 10
    /// - `GROUPSYNC_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error for a zero poll interval or a non-HTTP base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero poll interval or a non-HTTP base URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = normalize_base_url(
            &lookup("GROUPSYNC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        )?;
        let access_token = lookup("GROUPSYNC_ACCESS_TOKEN").filter(|s| !s.trim().is_empty());

        let group_poll_ms = parse_or(&lookup, "GROUPSYNC_GROUP_POLL_MS", DEFAULT_GROUP_POLL_MS);
        let feed_poll_ms = parse_or(&lookup, "GROUPSYNC_FEED_POLL_MS", DEFAULT_FEED_POLL_MS);
        let group_poll_interval = non_zero_ms("GROUPSYNC_GROUP_POLL_MS", group_poll_ms)?;
        let feed_poll_interval = non_zero_ms("GROUPSYNC_FEED_POLL_MS", feed_poll_ms)?;

        let timeouts = HttpTimeouts {
            request_secs: parse_or(&lookup, "GROUPSYNC_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "GROUPSYNC_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, access_token, group_poll_interval, feed_poll_interval, timeouts })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            access_token: None,
            group_poll_interval: Duration::from_millis(DEFAULT_GROUP_POLL_MS),
            feed_poll_interval: Duration::from_millis(DEFAULT_FEED_POLL_MS),
            timeouts: HttpTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

/// Trim trailing slashes and require an HTTP(S) scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for any other scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

/// Convert a millisecond setting into a poll interval; zero would spin.
///
/// # Errors
///
/// Returns [`ConfigError::ZeroInterval`] naming `var` when `ms` is zero.
pub fn non_zero_ms(var: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::ZeroInterval { var });
    }
    Ok(Duration::from_millis(ms))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
