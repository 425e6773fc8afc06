use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub channel: ChannelConfig,
    pub nlu: NluConfig,
    pub notifications: NotificationsConfig,
    pub event: EventConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub app_token: SecretString,
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct NluConfig {
    pub provider: NluProvider,
    pub min_confidence: f64,
}

#[derive(Clone, Debug)]
pub struct NotificationsConfig {
    pub webhook_url: Option<String>,
    pub sender: String,
    pub recipient: String,
}

/// Event facts rendered into the root interaction's informational replies.
#[derive(Clone, Debug)]
pub struct EventConfig {
    pub name: String,
    pub venue: String,
    pub schedule: String,
    pub attendees_url: String,
    pub calendar_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NluProvider {
    Keyword,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub nlu_provider: Option<NluProvider>,
    pub nlu_min_confidence: Option<f64>,
    pub channel_app_token: Option<String>,
    pub channel_bot_token: Option<String>,
    pub notifications_webhook_url: Option<String>,
    pub event_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://usher.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            channel: ChannelConfig {
                app_token: String::new().into(),
                bot_token: String::new().into(),
            },
            nlu: NluConfig { provider: NluProvider::Keyword, min_confidence: 0.5 },
            notifications: NotificationsConfig {
                webhook_url: None,
                sender: "Usher <noreply@example.com>".to_string(),
                recipient: "organizers@example.com".to_string(),
            },
            event: EventConfig {
                name: "the Horizon Symposium".to_string(),
                venue: "Meridian Conference Center, 500 Harbor Way".to_string(),
                schedule: "Wednesday, April 8th from 12:30pm to 5pm".to_string(),
                attendees_url: "https://example.com/attendees".to_string(),
                calendar_url: "https://example.com/horizon-symposium.ics".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for NluProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "disabled" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unsupported nlu provider `{other}` (expected keyword|disabled)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let maybe_path = resolve_config_path(options.config_path.as_deref());
        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            return Err(ConfigError::MissingConfigFile(
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
            ));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(&options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            apply_option(&mut self.database.url, database.url);
            apply_option(&mut self.database.max_connections, database.max_connections);
            apply_option(&mut self.database.timeout_secs, database.timeout_secs);
        }
        if let Some(channel) = patch.channel {
            if let Some(token) = channel.app_token {
                self.channel.app_token = token.into();
            }
            if let Some(token) = channel.bot_token {
                self.channel.bot_token = token.into();
            }
        }
        if let Some(nlu) = patch.nlu {
            apply_option(&mut self.nlu.provider, nlu.provider);
            apply_option(&mut self.nlu.min_confidence, nlu.min_confidence);
        }
        if let Some(notifications) = patch.notifications {
            if notifications.webhook_url.is_some() {
                self.notifications.webhook_url = notifications.webhook_url;
            }
            apply_option(&mut self.notifications.sender, notifications.sender);
            apply_option(&mut self.notifications.recipient, notifications.recipient);
        }
        if let Some(event) = patch.event {
            apply_option(&mut self.event.name, event.name);
            apply_option(&mut self.event.venue, event.venue);
            apply_option(&mut self.event.schedule, event.schedule);
            apply_option(&mut self.event.attendees_url, event.attendees_url);
            apply_option(&mut self.event.calendar_url, event.calendar_url);
        }
        if let Some(server) = patch.server {
            apply_option(&mut self.server.bind_address, server.bind_address);
            apply_option(&mut self.server.health_check_port, server.health_check_port);
            apply_option(&mut self.server.graceful_shutdown_secs, server.graceful_shutdown_secs);
        }
        if let Some(logging) = patch.logging {
            apply_option(&mut self.logging.level, logging.level);
            apply_option(&mut self.logging.format, logging.format);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = read_env("USHER_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(level) = read_env("USHER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = read_env("USHER_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "USHER_LOG_FORMAT".to_string(),
                value: format,
            })?;
        }
        if let Some(provider) = read_env("USHER_NLU_PROVIDER") {
            self.nlu.provider =
                provider.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "USHER_NLU_PROVIDER".to_string(),
                    value: provider,
                })?;
        }
        if let Some(confidence) = read_env("USHER_NLU_MIN_CONFIDENCE") {
            self.nlu.min_confidence =
                confidence.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "USHER_NLU_MIN_CONFIDENCE".to_string(),
                    value: confidence,
                })?;
        }
        if let Some(token) = read_env("USHER_CHANNEL_APP_TOKEN") {
            self.channel.app_token = token.into();
        }
        if let Some(token) = read_env("USHER_CHANNEL_BOT_TOKEN") {
            self.channel.bot_token = token.into();
        }
        if let Some(url) = read_env("USHER_NOTIFY_WEBHOOK_URL") {
            self.notifications.webhook_url = Some(url);
        }
        if let Some(name) = read_env("USHER_EVENT_NAME") {
            self.event.name = name;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.database_url {
            self.database.url = url.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(provider) = overrides.nlu_provider {
            self.nlu.provider = provider;
        }
        if let Some(confidence) = overrides.nlu_min_confidence {
            self.nlu.min_confidence = confidence;
        }
        if let Some(token) = &overrides.channel_app_token {
            self.channel.app_token = token.clone().into();
        }
        if let Some(token) = &overrides.channel_bot_token {
            self.channel.bot_token = token.clone().into();
        }
        if let Some(url) = &overrides.notifications_webhook_url {
            self.notifications.webhook_url = Some(url.clone());
        }
        if let Some(name) = &overrides.event_name {
            self.event.name = name.clone();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.nlu.min_confidence) {
            return Err(ConfigError::Validation(
                "nlu.min_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.event.name.trim().is_empty() {
            return Err(ConfigError::Validation("event.name must not be empty".to_string()));
        }
        Ok(())
    }
}

const DEFAULT_CONFIG_FILE: &str = "usher.toml";

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = read_env("USHER_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn apply_option<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    channel: Option<ChannelPatch>,
    nlu: Option<NluPatch>,
    notifications: Option<NotificationsPatch>,
    event: Option<EventPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPatch {
    app_token: Option<String>,
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    provider: Option<NluProvider>,
    min_confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationsPatch {
    webhook_url: Option<String>,
    sender: Option<String>,
    recipient: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EventPatch {
    name: Option<String>,
    venue: Option<String>,
    schedule: Option<String>,
    attendees_url: Option<String>,
    calendar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
