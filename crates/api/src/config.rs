//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use pricewatch_observability::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Transport settings for `/ws` connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeSettings {
    /// Outbound queue depth per session; a full queue drops the session.
    pub session_buffer: usize,
    /// Bound on one socket write before the session is dropped.
    pub send_timeout: Duration,
    pub ping_interval: Duration,
    /// Close connections that send nothing (not even pongs) for this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            session_buffer: 64,
            send_timeout: Duration::from_millis(5_000),
            ping_interval: Duration::from_secs(30),
            idle_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub realtime: RealtimeSettings,
    /// `None` runs the recommendation gateway with a disabled model.
    pub gemini: Option<GeminiSettings>,
    /// `Some(url)` when `USE_PERSISTENT_STORES=true`.
    pub database_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_format: LogFormat::Json,
            realtime: RealtimeSettings::default(),
            gemini: None,
            database_url: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = parse_or(&get, "BIND_ADDR", defaults.bind_addr)?;
        let log_format = parse_or(&get, "LOG_FORMAT", defaults.log_format)?;

        let realtime = RealtimeSettings {
            session_buffer: parse_or(&get, "WS_SESSION_BUFFER", defaults.realtime.session_buffer)?,
            send_timeout: Duration::from_millis(parse_or(
                &get,
                "WS_SEND_TIMEOUT_MS",
                defaults.realtime.send_timeout.as_millis() as u64,
            )?),
            ping_interval: Duration::from_secs(parse_or(
                &get,
                "WS_PING_INTERVAL_SECS",
                defaults.realtime.ping_interval.as_secs(),
            )?),
            idle_timeout: parse_opt::<u64>(&get, "WS_IDLE_TIMEOUT_SECS")?.map(Duration::from_secs),
        };
        if realtime.session_buffer == 0 {
            return Err(invalid("WS_SESSION_BUFFER", "0", "must be at least 1"));
        }
        if realtime.ping_interval.is_zero() {
            return Err(invalid("WS_PING_INTERVAL_SECS", "0", "must be at least 1"));
        }

        let gemini = get("GEMINI_API_KEY").map(|api_key| GeminiSettings {
            api_key,
            model: get("GEMINI_MODEL"),
            base_url: get("GEMINI_BASE_URL"),
        });

        let use_persistent = parse_or(&get, "USE_PERSISTENT_STORES", false)?;
        let database_url = if use_persistent {
            Some(get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?)
        } else {
            None
        };

        Ok(Self {
            bind_addr,
            log_format,
            realtime,
            gemini,
            database_url,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| invalid(key, &raw, e)))
        .transpose()
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(config(&[]).unwrap(), ApiConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("LOG_FORMAT", "pretty"),
            ("WS_SESSION_BUFFER", "8"),
            ("WS_SEND_TIMEOUT_MS", "250"),
            ("WS_PING_INTERVAL_SECS", "10"),
            ("WS_IDLE_TIMEOUT_SECS", "120"),
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.realtime.session_buffer, 8);
        assert_eq!(cfg.realtime.send_timeout, Duration::from_millis(250));
        assert_eq!(cfg.realtime.idle_timeout, Some(Duration::from_secs(120)));
        let gemini = cfg.gemini.unwrap();
        assert_eq!(gemini.model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(gemini.base_url, None);
    }

    #[test]
    fn rejects_garbage_and_zero_buffer() {
        assert!(matches!(
            config(&[("WS_SEND_TIMEOUT_MS", "soon")]),
            Err(ConfigError::Invalid { key: "WS_SEND_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            config(&[("WS_SESSION_BUFFER", "0")]),
            Err(ConfigError::Invalid { key: "WS_SESSION_BUFFER", .. })
        ));
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn persistent_stores_require_database_url() {
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "true")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/pricewatch"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/pricewatch"));
    }

    #[test]
    fn blank_api_key_disables_gemini() {
        assert!(config(&[("GEMINI_API_KEY", "  ")]).unwrap().gemini.is_none());
    }
}
