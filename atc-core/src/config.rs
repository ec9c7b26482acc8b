//! Configuration file management for atc-tower.
//!
//! Reads/writes `~/.atc-tower/config.toml` with feed connection settings,
//! tracker thresholds, the catalog source, and the log level. Every key is
//! optional; missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalogs;
use crate::framer::DEFAULT_MAX_BUFFER;
use crate::types::{AtcError, Result};

/// Full configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub tracker: TrackerConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
    pub max_buffer_bytes: usize,
    pub read_chunk_bytes: usize,
    pub reconnect_delay_secs: u64,
    pub max_reconnect_delay_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            max_buffer_bytes: DEFAULT_MAX_BUFFER,
            read_chunk_bytes: 4096,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
        }
    }
}

/// Thresholds for the flight tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Updates closer together than this can be rejected as teleports.
    pub teleport_window_secs: f64,
    /// Jump distance that counts as a teleport inside the window.
    pub teleport_distance_m: f64,
    pub arrival_radius_m: f64,
    /// Drop flights silent for longer than this. `None` keeps them forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_after_secs: Option<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            teleport_window_secs: 2.0,
            teleport_distance_m: 80_000.0,
            arrival_radius_m: 5_000.0,
            stale_after_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog TOML file. Built-in tables are used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".into(),
        }
    }
}

impl Config {
    /// Catalogs named by `[catalog]`, or the built-in tables.
    pub fn catalogs(&self) -> Result<Catalogs> {
        match &self.catalog.path {
            Some(path) => Catalogs::load(path),
            None => Ok(Catalogs::builtin()),
        }
    }
}

/// Get the config directory path (`~/.atc-tower/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".atc-tower")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.atc-tower/config.toml`. A missing file yields
/// defaults; an unreadable one is an error for the caller to handle.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file())
}

/// Load config from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Save config to `~/.atc-tower/config.toml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| AtcError::Config(e.to_string()))?;
    }
    let text = serialize_config(config)?;
    std::fs::write(path, text).map_err(|e| AtcError::Config(e.to_string()))?;
    Ok(())
}

pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).map_err(|e| AtcError::Config(e.to_string()))
}

pub fn serialize_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| AtcError::Config(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed.port, 9000);
        assert_eq!(config.feed.max_buffer_bytes, 1_048_576);
        assert_eq!(config.tracker.teleport_window_secs, 2.0);
        assert!(config.tracker.stale_after_secs.is_none());
        assert!(config.catalog.path.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
[feed]
host = "10.0.0.5"
port = 7001

[tracker]
arrival_radius_m = 2500.0
stale_after_secs = 600.0

[catalog]
path = "/etc/atc/catalog.toml"

[log]
level = "debug"
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.feed.host, "10.0.0.5");
        assert_eq!(config.feed.port, 7001);
        // unset keys keep defaults
        assert_eq!(config.feed.read_chunk_bytes, 4096);
        assert_eq!(config.tracker.arrival_radius_m, 2500.0);
        assert_eq!(config.tracker.teleport_distance_m, 80_000.0);
        assert_eq!(config.tracker.stale_after_secs, Some(600.0));
        assert_eq!(
            config.catalog.path,
            Some(PathBuf::from("/etc/atc/catalog.toml"))
        );
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[feed]\nport = \"nine\"").unwrap_err();
        assert!(matches!(err, AtcError::Config(_)));
    }

    #[test]
    fn test_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.feed.port = 9100;
        config.tracker.stale_after_secs = Some(120.0);
        config.log.level = "warn".into();

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_catalogs_default_to_builtin() {
        let catalogs = Config::default().catalogs().unwrap();
        assert_eq!(catalogs.airports.len(), Catalogs::builtin().airports.len());
    }
}
