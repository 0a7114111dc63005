//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::enrichment::RetryPolicy;
use crate::error::ConfigError;

/// Default location of the user record file.
pub const DEFAULT_DATA_FILE: &str = "./data/user_data.json";

/// Default public-IP lookup endpoint.
pub const DEFAULT_IP_API_URL: &str = "https://api.ipify.org?format=json";

/// Bot configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Path of the JSON file holding user records.
    pub data_file: PathBuf,
    /// Endpoint queried by the enrichment resolver.
    pub ip_api_url: String,
    /// Retry policy for background enrichment.
    pub retry: RetryPolicy,
    /// Sessions idle for longer than this are pruned.
    pub session_idle_timeout: Duration,
    /// How often the idle pruner runs.
    pub prune_interval: Duration,
    /// Telegram settings, present only when a bot token is configured.
    pub telegram: Option<TelegramConfig>,
}

/// Telegram channel settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub allowed_users: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            ip_api_url: DEFAULT_IP_API_URL.to_string(),
            retry: RetryPolicy::default(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(600),
            telegram: None,
        }
    }
}

impl BotConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_file = std::env::var("PIZZA_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);

        let ip_api_url = std::env::var("PIZZA_IP_API_URL").unwrap_or(defaults.ip_api_url);

        let retry = RetryPolicy {
            max_attempts: env_parse("PIZZA_RESOLVE_ATTEMPTS", defaults.retry.max_attempts)?,
            attempt_timeout: Duration::from_secs(env_parse(
                "PIZZA_RESOLVE_TIMEOUT_SECS",
                defaults.retry.attempt_timeout.as_secs(),
            )?),
            backoff: Duration::from_secs(env_parse(
                "PIZZA_RESOLVE_BACKOFF_SECS",
                defaults.retry.backoff.as_secs(),
            )?),
        };
        if retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PIZZA_RESOLVE_ATTEMPTS".into(),
                message: "must be at least 1".into(),
            });
        }

        let session_idle_timeout = Duration::from_secs(env_parse(
            "PIZZA_SESSION_IDLE_SECS",
            defaults.session_idle_timeout.as_secs(),
        )?);

        let telegram = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(|token| TelegramConfig {
                bot_token: SecretString::from(token),
                allowed_users: parse_list(
                    &std::env::var("TELEGRAM_ALLOWED_USERS").unwrap_or_else(|_| "*".to_string()),
                ),
            });

        Ok(Self {
            data_file,
            ip_api_url,
            retry,
            session_idle_timeout,
            prune_interval: defaults.prune_interval,
            telegram,
        })
    }
}

/// Read and parse an env var, using `default` when it is unset.
fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated list, dropping empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
