use std::time::Duration;

use crate::poller::PollConfig;

/// Default gateway host when `GATEWAY_HOST` is unset.
pub const DEFAULT_GATEWAY_HOST: &str = "localhost";
/// Default gateway port when `GATEWAY_PORT` is unset (the NodePort /
/// port-forward the gateway is usually reached through).
pub const DEFAULT_GATEWAY_PORT: u16 = 30002;

/// Per-operation request timeouts.
///
/// Uploads are bound by payload size and get the longest window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub login: Duration,
    pub upload: Duration,
    pub status: Duration,
    pub download: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(10),
            upload: Duration::from_secs(60),
            status: Duration::from_secs(10),
            download: Duration::from_secs(30),
        }
    }
}

/// Gateway client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:30002`.
    pub base_url: String,
    pub timeouts: TimeoutPolicy,
    pub poll: PollConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                         | Default                    |
    /// |---------------------------------|----------------------------|
    /// | `GATEWAY_URL`                   | `http://{HOST}:{PORT}`     |
    /// | `GATEWAY_HOST`                  | `localhost`                |
    /// | `GATEWAY_PORT`                  | `30002`                    |
    /// | `GATEWAY_LOGIN_TIMEOUT_SECS`    | `10`                       |
    /// | `GATEWAY_UPLOAD_TIMEOUT_SECS`   | `60`                       |
    /// | `GATEWAY_STATUS_TIMEOUT_SECS`   | `10`                       |
    /// | `GATEWAY_DOWNLOAD_TIMEOUT_SECS` | `30`                       |
    /// | `POLL_MAX_ATTEMPTS`             | `15`                       |
    /// | `POLL_INTERVAL_SECS`            | `2`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match lookup("GATEWAY_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => {
                let host = lookup("GATEWAY_HOST").unwrap_or_else(|| DEFAULT_GATEWAY_HOST.into());
                let port: u16 = parse_or(&lookup, "GATEWAY_PORT", DEFAULT_GATEWAY_PORT, "a valid u16")?;
                format!("http://{host}:{port}")
            }
        };

        let defaults = TimeoutPolicy::default();
        let timeouts = TimeoutPolicy {
            login: secs_or(&lookup, "GATEWAY_LOGIN_TIMEOUT_SECS", defaults.login)?,
            upload: secs_or(&lookup, "GATEWAY_UPLOAD_TIMEOUT_SECS", defaults.upload)?,
            status: secs_or(&lookup, "GATEWAY_STATUS_TIMEOUT_SECS", defaults.status)?,
            download: secs_or(&lookup, "GATEWAY_DOWNLOAD_TIMEOUT_SECS", defaults.download)?,
        };

        let poll_defaults = PollConfig::default();
        let poll = PollConfig {
            max_attempts: parse_or(
                &lookup,
                "POLL_MAX_ATTEMPTS",
                poll_defaults.max_attempts,
                "a valid u32",
            )?,
            interval: secs_or(&lookup, "POLL_INTERVAL_SECS", poll_defaults.interval)?,
        };

        Ok(Self {
            base_url,
            timeouts,
            poll,
        })
    }
}

fn parse_or<F, T>(
    lookup: &F,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}

fn secs_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, name, default.as_secs(), "a whole number of seconds").map(Duration::from_secs)
}
