//! Configuration loading and validation
//!
//! Two stages:
//! 1. **TOML file**: raw values as the user wrote them, defaults filled in by serde
//! 2. **Settings**: validated, typed values handed to the import pipeline
//!
//! A missing config file is not an error. A default file is written in its place
//! so the user has something to edit, and validation then reports what is missing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Client name, config section name and config directory name
pub const WATCHER_NAME: &str = "aw-importer-lastfm";

/// Contents written when no config file exists yet
pub const DEFAULT_CONFIG: &str = r#"[aw-importer-lastfm]
data_path = ""
poll_time = 60.0
default_duration = 60
"#;

/// How the importer decides when to look for new export files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Periodically scan the data directory
    #[default]
    Poll,
    /// React to filesystem create notifications
    Watch,
}

impl FromStr for TriggerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" | "polling" => Ok(TriggerMode::Poll),
            "watch" | "notify" | "notification" => Ok(TriggerMode::Watch),
            other => Err(Error::InvalidInput(format!(
                "unknown trigger mode '{}' (expected 'poll' or 'watch')",
                other
            ))),
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMode::Poll => write!(f, "poll"),
            TriggerMode::Watch => write!(f, "watch"),
        }
    }
}

/// Raw configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(rename = "aw-importer-lastfm", default)]
    pub importer: ImporterSection,
}

/// The `[aw-importer-lastfm]` section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImporterSection {
    /// Folder holding the scrobble CSV exports
    #[serde(default)]
    pub data_path: String,

    /// Seconds between directory scans (polling trigger only)
    #[serde(default = "default_poll_time")]
    pub poll_time: f64,

    /// Duration in seconds given to every imported event
    #[serde(default)]
    pub default_duration: i64,

    /// Trigger strategy
    #[serde(default)]
    pub trigger: TriggerMode,

    /// Event server base URL, e.g. `http://127.0.0.1:5600`
    #[serde(default)]
    pub server_url: Option<String>,

    /// Host name used in the bucket name
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Default for ImporterSection {
    fn default() -> Self {
        Self {
            data_path: String::new(),
            poll_time: default_poll_time(),
            default_duration: 0,
            trigger: TriggerMode::default(),
            server_url: None,
            hostname: None,
        }
    }
}

fn default_poll_time() -> f64 {
    60.0
}

/// Validated settings consumed by the import pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    /// Always non-zero
    pub default_duration: u32,
    pub poll_interval: Duration,
    pub trigger: TriggerMode,
    pub server_url: Option<String>,
    pub hostname: Option<String>,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the config file, writing the default file first if none exists
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            write_default_config(path)?;
            info!("Created default config file: {}", path.display());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Turn raw values into [`Settings`]
    ///
    /// Fails when `data_path` is empty, `default_duration` is not a positive
    /// number of seconds, or `poll_time` is not a positive, representable
    /// number of seconds.
    pub fn validate(&self) -> Result<Settings> {
        let section = &self.importer;

        let data_path = section.data_path.trim();
        if data_path.is_empty() {
            return Err(Error::Config(
                "You need to specify the folder that has the data files (data_path)".to_string(),
            ));
        }

        if section.default_duration <= 0 {
            return Err(Error::Config(
                "You need to specify a default duration for the events (default_duration)"
                    .to_string(),
            ));
        }
        let default_duration = u32::try_from(section.default_duration).map_err(|_| {
            Error::Config(format!(
                "default_duration out of range: {}",
                section.default_duration
            ))
        })?;

        let poll_interval = Duration::try_from_secs_f64(section.poll_time)
            .ok()
            .filter(|interval| !interval.is_zero())
            .ok_or_else(|| {
                Error::Config(format!(
                    "poll_time must be a positive number of seconds, got {}",
                    section.poll_time
                ))
            })?;

        Ok(Settings {
            data_path: PathBuf::from(data_path),
            default_duration,
            poll_interval,
            trigger: section.trigger,
            server_url: section.server_url.clone().filter(|s| !s.trim().is_empty()),
            hostname: section.hostname.clone().filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Per-user config directory for the importer, e.g. `~/.config/aw-importer-lastfm`
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(WATCHER_NAME))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Default config file location inside [`config_dir`]
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(format!("{}.toml", WATCHER_NAME)))
}

fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
