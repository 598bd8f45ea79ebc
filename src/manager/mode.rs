//! Job mode for StartUnit/StopUnit/RestartUnit

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How systemd resolves conflicts with already queued jobs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Replace conflicting queued jobs
    #[default]
    Replace,
    /// Fail if the job conflicts with a queued one
    Fail,
    /// Stop every unit not required by this one
    Isolate,
    /// Ignore unit dependencies
    IgnoreDependencies,
    /// Ignore requirement dependencies, keep ordering
    IgnoreRequirements,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Fail => "fail",
            Self::Isolate => "isolate",
            Self::IgnoreDependencies => "ignore-dependencies",
            Self::IgnoreRequirements => "ignore-requirements",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown job mode: {0}")]
pub struct UnknownMode(String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "fail" => Ok(Self::Fail),
            "isolate" => Ok(Self::Isolate),
            "ignore-dependencies" => Ok(Self::IgnoreDependencies),
            "ignore-requirements" => Ok(Self::IgnoreRequirements),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
