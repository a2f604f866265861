//! Configuration system for duet.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $DUET_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/duet/config.toml
//!   3. ~/.config/duet/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DuetConfig {
    pub network: NetworkConfig,
    pub brokers: BrokersConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the WebSocket gateway binds to.
    pub bind_addr: String,
    /// WebSocket gateway port. 0 = OS-assigned.
    pub ws_port: u16,
    /// Admin API port, always on 127.0.0.1.
    pub api_port: u16,
    /// Largest inbound WebSocket frame accepted by the gateway.
    pub max_frame_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokersConfig {
    /// Text chat broker at /ws/chat.
    pub chat: bool,
    /// Call-signaling broker at /ws/call.
    pub call: bool,
    /// Seconds between broker snapshot log lines. 0 = off.
    pub snapshot_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Push `queue-update` to waiters whenever the queue changes.
    pub queue_updates: bool,
    /// Consult the display-name block list before pairing.
    pub block_list: bool,
    /// Name pairs that must never be matched together.
    pub blocked_pairs: Vec<[String; 2]>,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            ws_port: 3001,
            api_port: 9001,
            max_frame_bytes: 1_048_576, // 1 MB
        }
    }
}

impl Default for BrokersConfig {
    fn default() -> Self {
        Self {
            chat: true,
            call: true,
            snapshot_interval_secs: 30,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            queue_updates: true,
            block_list: false,
            blocked_pairs: Vec::new(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("duet")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl DuetConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file(&Self::file_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(DuetConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("DUET_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        Self::write_default_to(&path)?;
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        let text =
            toml::to_string_pretty(&DuetConfig::default()).map_err(ConfigError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))
    }

    /// Apply DUET_* overrides from `var`. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let flag = |v: String| v == "true" || v == "1";

        if let Some(v) = var("DUET_NETWORK__BIND_ADDR") {
            self.network.bind_addr = v;
        }
        if let Some(p) = var("DUET_NETWORK__WS_PORT").and_then(|v| v.parse().ok()) {
            self.network.ws_port = p;
        }
        if let Some(p) = var("DUET_NETWORK__API_PORT").and_then(|v| v.parse().ok()) {
            self.network.api_port = p;
        }
        if let Some(v) = var("DUET_BROKERS__CHAT") {
            self.brokers.chat = flag(v);
        }
        if let Some(v) = var("DUET_BROKERS__CALL") {
            self.brokers.call = flag(v);
        }
        if let Some(v) = var("DUET_MATCHING__QUEUE_UPDATES") {
            self.matching.queue_updates = flag(v);
        }
        if let Some(v) = var("DUET_MATCHING__BLOCK_LIST") {
            self.matching.block_list = flag(v);
        }
    }
}
