//! # Application Configuration
//!
//! Loads and stores the user-editable settings in
//! `~/.config/radioringcon/config.toml`. Every key has a default, so a missing
//! file or a partially filled file still yields a usable configuration. The
//! file is created with defaults on first start.
//!
//! The last broker the user connected to is written back through
//! [`AppConfig::remember_broker`], so the connection fields are pre-filled on
//! the next start.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::mqtt::config::BrokerSettings;

const CONFIG_DIR: &str = ".config/radioringcon";
const CONFIG_FILE: &str = "config.toml";

/// Complete on-disk configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Broker address and connection tuning
    pub broker: BrokerSettings,
    /// Display settings
    pub ui: UiConfig,
}

/// Display settings for the control window.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Number of lines kept in the connection log
    pub log_capacity: usize,
    /// Repaint period while no input arrives, keeps incoming values flowing
    pub repaint_interval_ms: u64,
    /// Fonts tried in order; the first readable one becomes the CJK fallback
    pub font_paths: Vec<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            log_capacity: 10,
            repaint_interval_ms: 33,
            font_paths: [
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
                "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
                "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
                "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
                "/System/Library/Fonts/PingFang.ttc",
                "C:\\Windows\\Fonts\\msjh.ttc",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the default location, writing defaults
    /// there first if no file exists yet.
    pub async fn load() -> Result<Self> {
        let path = default_config_path();
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            info!("No config at {}, writing defaults", path.display());
            let config = AppConfig::default();
            config.save_to(&path).await?;
            return Ok(config);
        }
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;

        debug!("Config written to {}", path.display());
        Ok(())
    }

    /// Stores the broker address the user just connected to. Returns whether
    /// anything changed.
    pub fn remember_broker(&mut self, host: &str, ws_port: u16) -> bool {
        if self.broker.host == host && self.broker.ws_port == ws_port {
            return false;
        }
        self.broker.host = host.to_string();
        self.broker.ws_port = ws_port;
        true
    }

    /// Persists the configuration in the background without blocking the
    /// caller. Failures are logged.
    pub fn save_in_background(&self) {
        let config = self.clone();
        tokio::spawn(async move {
            let path = default_config_path();
            match config.save_to(&path).await {
                Ok(()) => info!("Saved broker settings to {}", path.display()),
                Err(e) => warn!("Failed to save config: {}", e),
            }
        });
    }
}

pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("radioringcon-test-{}", uuid::Uuid::new_v4().simple()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [broker]
            host = "10.0.0.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.host, "10.0.0.5");
        assert_eq!(config.broker.ws_port, 8083);
        assert_eq!(config.broker.tcp_port, 1883);
        assert_eq!(config.ui.log_capacity, 10);
    }

    #[test]
    fn remembering_the_same_broker_is_a_no_op() {
        let mut config = AppConfig::default();
        assert!(!config.remember_broker("192.168.0.141", 8083));
        assert!(config.remember_broker("broker.local", 9001));
        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.ws_port, 9001);
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let path = scratch_path();
        let mut config = AppConfig::default();
        config.remember_broker("broker.local", 9001);
        config.ui.log_capacity = 25;

        config.save_to(&path).await.unwrap();
        let loaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn broken_file_is_an_error() {
        let path = scratch_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "broker = [").await.unwrap();

        assert!(AppConfig::load_from(&path).await.is_err());

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
