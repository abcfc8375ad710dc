use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{Catalog, PlayerSpec, Roster, VideoSpec};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Tracked videos, in display order
    #[serde(default)]
    pub videos: Vec<VideoSpec>,
    /// Players and their attribution lists
    #[serde(default)]
    pub players: Vec<PlayerSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Snapshot age after which a new refresh cycle runs (default: 4h)
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
    /// How often the scheduler checks staleness (default: 60s)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    4 * 60 * 60
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON snapshot file
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("engagement_data.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    /// Pause before every outbound request, in milliseconds
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_request_delay() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            request_delay_ms: default_request_delay(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the rolling log file; console only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("refresh.interval_secs", default_refresh_interval() as i64)?
            .set_default("refresh.poll_interval_secs", default_poll_interval() as i64)?
            .set_default("storage.data_file", "engagement_data.json")?
            .set_default("server.port", default_port() as i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ENGAGEMENT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ENGAGEMENT__STORAGE__DATA_FILE, etc.)
            .add_source(
                Environment::with_prefix("ENGAGEMENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables understood by existing deployments
            .set_override_option("storage.data_file", std::env::var("DATA_FILE").ok())?
            .set_override_option(
                "refresh.interval_secs",
                std::env::var("REFRESH_INTERVAL")
                    .ok()
                    .and_then(|v| v.trim().parse::<i64>().ok()),
            )?
            .set_override_option(
                "server.port",
                std::env::var("PORT")
                    .ok()
                    .and_then(|v| v.trim().parse::<i64>().ok()),
            )?;

        builder.build()?.try_deserialize()
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.videos.clone())
    }

    pub fn roster(&self) -> Roster {
        Roster::new(self.players.clone())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.refresh.interval_secs == 0 {
            errors.push("refresh.interval_secs must be positive".to_string());
        }
        if self.refresh.poll_interval_secs == 0 {
            errors.push("refresh.poll_interval_secs must be positive".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            errors.push("fetch.timeout_secs must be positive".to_string());
        }

        if self.videos.is_empty() {
            errors.push("no videos configured".to_string());
        }

        let mut video_keys = HashSet::new();
        for video in &self.videos {
            if video.key.trim().is_empty() {
                errors.push("video with empty key".to_string());
                continue;
            }
            if !video_keys.insert(video.key.as_str()) {
                errors.push(format!("duplicate video key '{}'", video.key));
            }
            if video.name.trim().is_empty() {
                errors.push(format!("video '{}' has an empty name", video.key));
            }
            if video.platforms.is_empty() {
                errors.push(format!("video '{}' has no platforms", video.key));
            }
            for (platform, locator) in &video.platforms {
                match url::Url::parse(locator) {
                    Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                    Ok(url) => errors.push(format!(
                        "video '{}' {} locator uses unsupported scheme '{}'",
                        video.key,
                        platform,
                        url.scheme()
                    )),
                    Err(e) => errors.push(format!(
                        "video '{}' {} locator is not a URL: {}",
                        video.key, platform, e
                    )),
                }
            }
        }

        let mut player_names = HashSet::new();
        for player in &self.players {
            if player.name.trim().is_empty() {
                errors.push("player with empty name".to_string());
            } else if !player_names.insert(player.name.as_str()) {
                errors.push(format!("duplicate player '{}'", player.name));
            }
            for entry in &player.attributions {
                if !video_keys.contains(entry.video_key.as_str()) {
                    errors.push(format!(
                        "player '{}' references unknown video '{}'",
                        player.name, entry.video_key
                    ));
                }
                if !entry.weight.is_finite() || entry.weight < 0.0 {
                    errors.push(format!(
                        "player '{}' has invalid weight {} for '{}'",
                        player.name, entry.weight, entry.video_key
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
