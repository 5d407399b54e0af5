//! TOML configuration for the garden process.
//!
//! ```toml
//! [storage]
//! data_dir = "data"
//!
//! [subscription]
//! enabled = true
//! base_url = "https://example.com"
//! user_id = "U1234"
//! timeout_seconds = 10
//! refresh_minutes = 15
//!
//! [logging]
//! level = "info"
//!
//! [game]
//! tick_seconds = 60
//! ```
//!
//! Every section and key is optional; a missing file yields [`Config::default`].

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const CONFIG_FILE: &str = "seirei-garden.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub subscription: SubscriptionConfig,
    pub logging: LoggingConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub enabled: bool,
    pub base_url: String,
    /// External (messaging platform) user id the status is keyed by.
    pub user_id: Option<String>,
    pub timeout_seconds: u64,
    pub refresh_minutes: u64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            user_id: None,
            timeout_seconds: 10,
            refresh_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Cadence of the decay/request tick.
    pub tick_seconds: u64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 60,
            seed: None,
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).await?;
        Self::parse(&content)
    }

    /// Like [`Config::load`], but a missing file yields defaults.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match fs::read_to_string(path.as_ref()).await {
            Ok(content) => Self::parse(&content),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.tick_seconds == 0 {
            return Err(anyhow!("game.tick_seconds must be greater than zero"));
        }
        if self.subscription.timeout_seconds == 0 {
            return Err(anyhow!("subscription.timeout_seconds must be greater than zero"));
        }
        if self.subscription.enabled {
            if self.subscription.base_url.trim().is_empty() {
                return Err(anyhow!("subscription.base_url is required when enabled"));
            }
            if self.subscription.user_id.as_deref().is_none_or(str::is_empty) {
                return Err(anyhow!("subscription.user_id is required when enabled"));
            }
            if self.subscription.refresh_minutes == 0 {
                return Err(anyhow!("subscription.refresh_minutes must be greater than zero"));
            }
        }
        Ok(())
    }
}
