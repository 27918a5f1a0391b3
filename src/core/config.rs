//! Runtime configuration
//!
//! Everything is read from the environment once at startup (`.env` is loaded
//! by `main` through dotenvy) and handed to the components that need it.

use std::env;
use std::time::Duration;

use log::LevelFilter;
use secrecy::SecretString;
use strum::{Display, EnumString};
use url::Url;

use crate::core::error::{AppError, AppResult};

/// Database file path default
pub const DEFAULT_DATABASE_PATH: &str = "workouts.sqlite";

/// Webhook delivery path default
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Listener port default
pub const DEFAULT_PORT: u16 = 8080;

/// Graceful shutdown bound default (seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Long-poll wait default (seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

/// Object storage endpoint that serves exercise videos
pub const DEFAULT_S3_ENDPOINT: &str = "https://storage.yandexcloud.net";

/// How updates reach the bot. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransportMode {
    /// Long polling via getUpdates
    Pull,
    /// Telegram pushes updates to our HTTP listener
    Push,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Public base URL Telegram will call, e.g. `https://bot.example.com`
    pub url: Option<String>,
    pub path: String,
    pub port: u16,
    pub secret_token: Option<String>,
}

impl WebhookConfig {
    /// Full URL registered with Telegram: the delivery path appended to the
    /// base URL, keeping any path prefix the base already has.
    pub fn endpoint(&self) -> AppResult<Url> {
        let base = self
            .url
            .as_deref()
            .ok_or_else(|| AppError::Config("WEBHOOK_URL is required in push mode".to_string()))?;
        Ok(Url::parse(&format!("{}{}", base.trim_end_matches('/'), self.path))?)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub endpoint: Url,
    pub bucket: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    pub bot_api_url: Option<Url>,
    pub database_path: String,
    pub mode: TransportMode,
    pub webhook: WebhookConfig,
    pub shutdown_timeout: Duration,
    pub poll_timeout: Duration,
    pub log: LogConfig,
    pub media: MediaConfig,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Unset and empty values are treated the same way.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or_else(|| AppError::Config("BOT_TOKEN (or TELOXIDE_TOKEN) is not set".to_string()))?;

        let bot_api_url = get("BOT_API_URL")
            .map(|raw| Url::parse(&raw).map_err(|e| AppError::Config(format!("Invalid BOT_API_URL: {}", e))))
            .transpose()?;

        let mode = match get("BOT_MODE") {
            Some(raw) => raw
                .parse::<TransportMode>()
                .map_err(|_| AppError::Config(format!("BOT_MODE must be 'pull' or 'push', got '{}'", raw)))?,
            None if parse_bool(get("WEBHOOK_ENABLED").as_deref()) => TransportMode::Push,
            None => TransportMode::Pull,
        };

        let webhook = WebhookConfig {
            url: get("WEBHOOK_URL"),
            path: get("WEBHOOK_PATH")
                .map(|p| if p.starts_with('/') { p } else { format!("/{}", p) })
                .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string()),
            port: parse_number(get("PORT"), "PORT", DEFAULT_PORT)?,
            secret_token: get("WEBHOOK_SECRET_TOKEN"),
        };

        let level = match get("LOG_LEVEL") {
            Some(raw) => raw
                .parse::<LevelFilter>()
                .map_err(|_| AppError::Config(format!("Invalid LOG_LEVEL: {}", raw)))?,
            None => LevelFilter::Info,
        };

        let endpoint = get("S3_ENDPOINT").unwrap_or_else(|| DEFAULT_S3_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint).map_err(|e| AppError::Config(format!("Invalid S3_ENDPOINT: {}", e)))?;

        let config = Config {
            bot_token: SecretString::from(bot_token),
            bot_api_url,
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            mode,
            webhook,
            shutdown_timeout: Duration::from_secs(parse_number(
                get("SHUTDOWN_TIMEOUT_SECONDS"),
                "SHUTDOWN_TIMEOUT_SECONDS",
                DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            )?),
            poll_timeout: Duration::from_secs(parse_number(
                get("POLL_TIMEOUT_SECONDS"),
                "POLL_TIMEOUT_SECONDS",
                DEFAULT_POLL_TIMEOUT_SECS,
            )?),
            log: LogConfig {
                level,
                file_path: get("LOG_FILE_PATH"),
            },
            media: MediaConfig {
                endpoint,
                bucket: get("S3_BUCKET_NAME"),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Overrides the transport mode, e.g. from `run --webhook`.
    pub fn with_mode(mut self, mode: TransportMode) -> AppResult<Self> {
        self.mode = mode;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> AppResult<()> {
        if self.mode == TransportMode::Push {
            self.webhook.endpoint()?;
        }
        if self.poll_timeout.is_zero() {
            return Err(AppError::Config("POLL_TIMEOUT_SECONDS must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> AppResult<T> {
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, value))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("BOT_TOKEN", "123:abc")]).unwrap();

        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert_eq!(config.mode, TransportMode::Pull);
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.webhook.path, "/webhook");
        assert_eq!(config.webhook.port, 8080);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_timeout, Duration::from_secs(60));
        assert_eq!(config.log.level, LevelFilter::Info);
        assert_eq!(config.media.endpoint.as_str(), "https://storage.yandexcloud.net/");
        assert!(config.media.bucket.is_none());
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = config_from(&[("TELOXIDE_TOKEN", "42:xyz")]).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "42:xyz");
    }

    #[test]
    fn test_push_mode_requires_webhook_url() {
        let err = config_from(&[("BOT_TOKEN", "t"), ("BOT_MODE", "push")]).unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL"));
    }

    #[test]
    fn test_push_mode_endpoint() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("BOT_MODE", "PUSH"),
            ("WEBHOOK_URL", "https://bot.example.com"),
            ("WEBHOOK_PATH", "hooks/tg"),
        ])
        .unwrap();

        assert_eq!(config.mode, TransportMode::Push);
        assert_eq!(config.webhook.path, "/hooks/tg");
        assert_eq!(
            config.webhook.endpoint().unwrap().as_str(),
            "https://bot.example.com/hooks/tg"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        for base in ["https://example.com/bot", "https://example.com/bot/"] {
            let webhook = WebhookConfig {
                url: Some(base.to_string()),
                path: DEFAULT_WEBHOOK_PATH.to_string(),
                port: DEFAULT_PORT,
                secret_token: None,
            };
            assert_eq!(webhook.endpoint().unwrap().as_str(), "https://example.com/bot/webhook");
        }
    }

    #[test]
    fn test_webhook_enabled_legacy_flag() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("WEBHOOK_ENABLED", "true"),
            ("WEBHOOK_URL", "https://bot.example.com"),
        ])
        .unwrap();
        assert_eq!(config.mode, TransportMode::Push);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(config_from(&[("BOT_TOKEN", "t"), ("PORT", "http")]).is_err());
        assert!(config_from(&[("BOT_TOKEN", "t"), ("POLL_TIMEOUT_SECONDS", "0")]).is_err());
        assert!(config_from(&[("BOT_TOKEN", "t"), ("BOT_MODE", "carrier-pigeon")]).is_err());
    }

    #[test]
    fn test_with_mode_override_validates() {
        let config = config_from(&[("BOT_TOKEN", "t")]).unwrap();
        assert!(config.with_mode(TransportMode::Push).is_err());
    }
}
