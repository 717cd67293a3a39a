//! Application settings
//!
//! Read from `config.toml` in the user config directory
//! (e.g. `~/.config/xuexi/config.toml`). Every key is optional:
//!
//! ```toml
//! learner = "default"
//! newDailyCap = 50
//! dayBoundary = "local"   # or "utc"
//! dataDir = "/path/to/data"
//! remoteDir = "/path/to/synced/copy"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::algorithm::NEW_DAILY_CAP;
use crate::flashcards::QueueOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Which calendar decides when the daily new-card counter resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// The device's local calendar date
    #[default]
    Local,
    /// The UTC calendar date
    Utc,
}

impl DayBoundary {
    /// Calendar date of an instant under this boundary
    pub fn date_of(self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            DayBoundary::Local => instant.with_timezone(&Local).date_naive(),
            DayBoundary::Utc => instant.date_naive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_learner")]
    pub learner: String,
    #[serde(default = "default_new_daily_cap")]
    pub new_daily_cap: u32,
    #[serde(default)]
    pub day_boundary: DayBoundary,
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Server-synced copy of the learner store, preferred over local data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<PathBuf>,
}

fn default_learner() -> String {
    "default".to_string()
}

fn default_new_daily_cap() -> u32 {
    NEW_DAILY_CAP
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            learner: default_learner(),
            new_daily_cap: default_new_daily_cap(),
            day_boundary: DayBoundary::default(),
            data_dir: None,
            remote_dir: None,
        }
    }
}

impl Settings {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("xuexi").join("config.toml"))
    }

    /// Load settings from a file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            new_daily_cap: self.new_daily_cap,
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day_boundary.date_of(now)
    }
}
