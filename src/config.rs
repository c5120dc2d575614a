use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings read at startup. Writing them back is the host's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Turn the mirror on once the host has settled after launch.
    pub enable_on_start: bool,
    /// Ticks to wait before that deferred enable.
    pub settle_ticks: u32,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enable_on_start: false,
            // Half a second at 60 Hz
            settle_ticks: 30,
            log_level: "info".to_string(),
        }
    }
}

impl MirrorConfig {
    /// Reads `path`; a file that does not exist means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        Self::from_json(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn default_path() -> PathBuf {
        config_dir().join("scene-mirror").join("config.json")
    }
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(dir);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}
