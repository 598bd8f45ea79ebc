//! Daemon settings
//!
//! ```toml
//! # /etc/unitsync.toml
//! services = ["nginx.service", "sshd"]
//! scan_interval = 10
//! ```
//!
//! Names without a unit suffix get ".service" appended.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::manager::SERVICE_SUFFIX;

pub const DEFAULT_SCAN_INTERVAL: u64 = 10;
pub const CONFIG_FILE: &str = "unitsync.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("scan_interval must be a positive number of seconds")]
    InvalidInterval,
}

/// Allow-list and polling interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Unit names eligible for tracking
    pub services: BTreeSet<String>,
    /// Seconds between reconciliation passes
    pub scan_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            services: BTreeSet::new(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl Settings {
    pub fn new<I, S>(services: I, scan_interval: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            services: services.into_iter().map(|s| canonical_name(s.as_ref())).collect(),
            scan_interval,
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let parsed: Self = toml::from_str(text)?;
        let settings = Self::new(&parsed.services, parsed.scan_interval);
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Like [`Settings::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    /// Add names to the allow-list
    pub fn extend<I, S>(&mut self, services: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.services
            .extend(services.into_iter().map(|s| canonical_name(s.as_ref())));
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }
}

/// Suffixes systemd recognizes as unit types
const UNIT_SUFFIXES: &[&str] = &[
    ".service",
    ".socket",
    ".device",
    ".mount",
    ".automount",
    ".swap",
    ".target",
    ".path",
    ".timer",
    ".slice",
    ".scope",
];

/// "nginx" -> "nginx.service"; names with a unit suffix are kept
pub fn canonical_name(name: &str) -> String {
    let name = name.trim();
    if UNIT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        name.to_string()
    } else {
        format!("{}{}", name, SERVICE_SUFFIX)
    }
}

/// /etc/unitsync.toml, or ~/.config/unitsync.toml for the user daemon
pub fn default_config_path(user: bool) -> PathBuf {
    if user {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_FILE)
    } else {
        Path::new("/etc").join(CONFIG_FILE)
    }
}
