//! On-disk shape of `bakerank-config.toml`.
//!
//! Every section is optional; missing values take the defaults below.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// The whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on. Overlays connect to `ws://<listen>/ws`.
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8765))
}

/// Score ledger section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Text file holding `user | score | last_bake_time` lines.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("bakerank_data.txt")
}

/// Reward assets section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Folder scanned for `*.png` rewards (`Legendary-*.png` are rare).
    #[serde(default = "default_overlay_dir")]
    pub overlay_dir: PathBuf,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            overlay_dir: default_overlay_dir(),
        }
    }
}

fn default_overlay_dir() -> PathBuf {
    PathBuf::from("overlay")
}

/// Bake engine section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between two counted bakes of the same user.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_cooldown_secs() -> u64 {
    60
}

/// Overlay broadcast section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// How long a single overlay may block a publish before it is dropped.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Frames queued per overlay.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

fn default_send_timeout_ms() -> u64 {
    2000
}

fn default_subscriber_buffer() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[ledger]
path = "/var/lib/bakerank/ledger.txt"

[rewards]
overlay_dir = "assets"

[engine]
cooldown_secs = 30

[broadcast]
send_timeout_ms = 500
subscriber_buffer = 8
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.ledger.path, PathBuf::from("/var/lib/bakerank/ledger.txt"));
        assert_eq!(config.rewards.overlay_dir, PathBuf::from("assets"));
        assert_eq!(config.engine.cooldown_secs, 30);
        assert_eq!(config.broadcast.send_timeout_ms, 500);
        assert_eq!(config.broadcast.subscriber_buffer, 8);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 8765);
        assert_eq!(config.ledger.path, PathBuf::from("bakerank_data.txt"));
        assert_eq!(config.rewards.overlay_dir, PathBuf::from("overlay"));
        assert_eq!(config.engine.cooldown_secs, 60);
        assert_eq!(config.broadcast.send_timeout_ms, 2000);
    }

    #[test]
    fn test_partial_section() {
        let config: FileConfig = toml::from_str("[broadcast]\nsubscriber_buffer = 4\n").unwrap();
        assert_eq!(config.broadcast.subscriber_buffer, 4);
        assert_eq!(config.broadcast.send_timeout_ms, 2000);
    }
}
