//! Server configuration: `bakerank-config.toml` plus command-line overrides,
//! resolved into a [`LoadedConfig`] once at startup.

pub mod file;

use crate::config::file::FileConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub ledger_path: PathBuf,
    pub overlay_dir: PathBuf,
    pub cooldown: time::Duration,
    pub send_timeout: std::time::Duration,
    pub subscriber_buffer: usize,
}

/// Reads, overrides and validates the config file.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// A missing file is not an error: every section has a default, and a
    /// fresh install should start with nothing but an `overlay/` folder.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str::<FileConfig>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.config_path.display(),
                    "Config file not found, using defaults"
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        // --listen wins over [server] listen
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        Ok(build_loaded_config(file_config))
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.engine.cooldown_secs == 0 {
            return Err(ConfigError::ValidationError(
                "engine.cooldown_secs must be greater than 0".to_string(),
            ));
        }
        if i64::try_from(config.engine.cooldown_secs).is_err() {
            return Err(ConfigError::ValidationError(
                "engine.cooldown_secs is too large".to_string(),
            ));
        }
        if config.broadcast.send_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "broadcast.send_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if config.broadcast.subscriber_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "broadcast.subscriber_buffer must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        listen: file_config.server.listen,
        ledger_path: file_config.ledger.path,
        overlay_dir: file_config.rewards.overlay_dir,
        cooldown: time::Duration::seconds(
            i64::try_from(file_config.engine.cooldown_secs).unwrap_or(i64::MAX),
        ),
        send_timeout: std::time::Duration::from_millis(file_config.broadcast.send_timeout_ms),
        subscriber_buffer: file_config.broadcast.subscriber_buffer,
    }
}
