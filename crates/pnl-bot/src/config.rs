//! Application configuration.

use crate::error::{AppError, AppResult};
use pnl_scheduler::{resolve_timezone, Tz};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file used when neither `--config` nor `PNL_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "PNL_CONFIG";

/// Env var overriding `telegram.bot_token`.
pub const BOT_TOKEN_ENV: &str = "PNL_BOT_TOKEN";

/// Env var overriding `telegram.chat_id`.
pub const CHAT_ID_ENV: &str = "PNL_CHAT_ID";

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bot token. Prefer `PNL_BOT_TOKEN` over committing it to the file.
    #[serde(default)]
    pub bot_token: String,
    /// Chat that receives summaries and is the only accepted command source.
    #[serde(default)]
    pub chat_id: String,
    /// `getUpdates` long-poll timeout (seconds). Default: 30.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Timeout for other Bot API requests (seconds). Default: 15.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            bot_token: String::new(),
            chat_id: String::new(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// JSON Lines ledger file.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,
    /// Schedule settings document.
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
}

fn default_ledger_path() -> String {
    "./data/ledger.jsonl".to_string()
}

fn default_settings_path() -> String {
    "./data/settings.json".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            settings_path: default_settings_path(),
        }
    }
}

/// Scheduling defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDefaults {
    /// Zone for the nightly fallback cleanup while the user has not set one.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    pnl_telemetry::DEFAULT_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub schedule: ScheduleDefaults,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Pick the config path: CLI arg > `PNL_CONFIG` > default.
    pub fn resolve_path(cli_arg: Option<String>) -> String {
        cli_arg
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load `path` (defaults when it does not exist), then apply env overrides.
    pub fn load(path: &str) -> AppResult<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_overrides(
            std::env::var(BOT_TOKEN_ENV).ok(),
            std::env::var(CHAT_ID_ENV).ok(),
        );
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Replace token and chat id with non-empty override values.
    pub fn apply_overrides(&mut self, bot_token: Option<String>, chat_id: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = chat_id.filter(|c| !c.trim().is_empty()) {
            self.telegram.chat_id = chat_id;
        }
    }

    /// Check everything the application needs before it starts.
    pub fn validate(&self) -> AppResult<()> {
        self.default_timezone()?;

        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::Config(format!(
                "telegram.bot_token is empty (set it in the file or via {BOT_TOKEN_ENV})"
            )));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(AppError::Config(format!(
                "telegram.chat_id is empty (set it in the file or via {CHAT_ID_ENV})"
            )));
        }
        if self.telegram.poll_timeout_secs == 0 || self.telegram.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "telegram timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolved `schedule.default_timezone`.
    pub fn default_timezone(&self) -> AppResult<Tz> {
        resolve_timezone(&self.schedule.default_timezone).map_err(|e| {
            AppError::Config(format!("schedule.default_timezone: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("123:abc".to_string()), Some("42".to_string()));
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.schedule.default_timezone, "UTC");
        assert_eq!(config.persistence.ledger_path, "./data/ledger.jsonl");
        assert_eq!(config.default_timezone().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "-100200"

            [schedule]
            default_timezone = "Europe/Kyiv"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.chat_id, "-100200");
        assert_eq!(config.telegram.request_timeout_secs, 15);
        assert_eq!(config.persistence.settings_path, "./data/settings.json");
        assert_eq!(config.telemetry.log_level, pnl_telemetry::DEFAULT_FILTER);
        assert_eq!(config.default_timezone().unwrap(), Tz::Europe__Kyiv);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let err = AppConfig::from_toml("[telegram\nbot_token = 1").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = valid();
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "42");

        config.apply_overrides(Some("999:xyz".to_string()), Some("7".to_string()));
        assert_eq!(config.telegram.bot_token, "999:xyz");
        assert_eq!(config.telegram.chat_id, "7");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(valid().validate().is_ok());

        // Missing token
        assert!(AppConfig::default().validate().unwrap_err().is_config_error());

        let mut config = valid();
        config.schedule.default_timezone = "Mars/Olympus".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Mars/Olympus"));

        let mut config = valid();
        config.telegram.poll_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let config = AppConfig::load(&path.to_string_lossy()).unwrap();
        assert_eq!(config.schedule.default_timezone, "UTC");
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&valid()).unwrap();
        assert!(toml_str.contains("default_timezone"));
        assert!(toml_str.contains("ledger_path"));
    }
}
