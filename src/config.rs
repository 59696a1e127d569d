//! User configuration from `<config dir>/natter/config.toml`.
//! Every key is optional; command-line flags override what is loaded here.

use crate::persistence::DEFAULT_SLOT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage slot the thread is saved under.
    #[serde(default = "default_slot")]
    pub slot: String,
    /// SQLite database file. Defaults to the platform data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// How often relative times are rechecked while idle.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slot: default_slot(),
            db_path: None,
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        // A zero interval would spin the event loop.
        Duration::from_millis(self.refresh_interval_ms.max(50))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config")
    }

    /// Load `path`, or the default location when `None`. A missing file at the
    /// default location yields defaults; an explicitly named one must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("natter").join("config.toml"))
}
