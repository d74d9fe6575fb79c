//! Configuration management
//!
//! Storage location, server address, default user, LINE credentials and the
//! digest schedule. Stored as TOML in the platform config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
    /// User defaults
    #[serde(default)]
    pub user: UserConfig,
    /// LINE push notifications
    #[serde(default)]
    pub line: LineSettings,
    /// Daily digest schedule
    #[serde(default)]
    pub digest: DigestConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file. Defaults to `learning.db` in the data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Partition used when a call carries no `user_id`
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

fn default_user_id() -> String {
    "default_user".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
        }
    }
}

/// LINE credentials as stored on disk. The key itself lives in a separate PEM file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSettings {
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Key id of the registered assertion signing key
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    /// User id the digest is pushed to
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default = "default_line_api_base")]
    pub api_base: String,
}

fn default_line_api_base() -> String {
    crate::notify::line::LINE_API_BASE.to_string()
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            channel_id: None,
            kid: None,
            private_key_path: None,
            recipient: None,
            api_base: default_line_api_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression, evaluated in UTC
    #[serde(default = "default_digest_cron")]
    pub cron: String,
    /// Offset used to decide what "today" means for the learner
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

fn default_true() -> bool {
    true
}

fn default_digest_cron() -> String {
    // 21:00 JST
    "0 0 12 * * *".to_string()
}

fn default_utc_offset() -> i32 {
    9
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            cron: default_digest_cron(),
            utc_offset_hours: default_utc_offset(),
        }
    }
}

impl Config {
    /// Load configuration from file, writing defaults when none exists
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Default user id, with `DEFAULT_USER_ID` taking precedence
    pub fn default_user_id(&self) -> String {
        std::env::var("DEFAULT_USER_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.user.default_user_id.clone())
    }

    /// Resolved database path
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("learning.db")),
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "learning-log", "learning-log")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("📁 Config file: {}", config_path()?.display());
    println!("🗄️  Database:    {}", config.database_path()?.display());
    println!("🌐 Server:      {}:{}", config.server.host, config.server.port);
    println!("👤 Default user: {}", config.default_user_id());

    let line_ready = crate::notify::LineConfig::from_config(&config)
        .map(|line| line.is_configured())
        .unwrap_or(false);
    println!("\n📊 Digest:");
    println!("  ✓ Enabled: {}", if config.digest.enabled { "Yes" } else { "No" });
    println!("  ✓ Schedule: {} (UTC)", config.digest.cron);
    println!("  ✓ Local offset: UTC{:+}", config.digest.utc_offset_hours);
    println!("  ✓ LINE: {}", if line_ready { "Configured" } else { "Not configured" });

    Ok(())
}

/// Overwrite the config file with defaults
pub fn reset_config() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}
