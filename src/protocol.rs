//! IPC protocol for unitsyncd
//!
//! Defines request/response types for unitsyncctl ↔ daemon communication.

use serde::{Deserialize, Serialize};

use crate::manager::Mode;

pub const SOCKET_NAME: &str = "unitsync.sock";

/// Socket path for the system daemon, or the per-user one with `user`
pub fn socket_path(user: bool) -> String {
    if user {
        format!("/run/user/{}/{}", nix::unistd::Uid::current(), SOCKET_NAME)
    } else {
        format!("/run/{}", SOCKET_NAME)
    }
}

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// List tracked units
    List,
    /// Show one tracked unit
    Status { name: String },
    /// Start a unit (mode defaults to replace)
    Start { name: String, mode: Option<Mode> },
    /// Stop a unit
    Stop { name: String, mode: Option<Mode> },
    /// Restart a unit
    Restart { name: String, mode: Option<Mode> },
    /// Enable the unit file
    Enable { name: String },
    /// Disable the unit file
    Disable { name: String },
    /// Switch on, showing "wait-on" until systemd reports back
    TurnOn { name: String },
    /// Switch off, showing "wait-off" until systemd reports back
    TurnOff { name: String },
    /// Query unit file state
    IsEnabled { name: String },
    /// Run a reconciliation pass now
    Refresh,
    /// Ping (health check)
    Ping,
}

/// Snapshot of a tracked unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub name: String,
    /// State as last reported (sub-state), or wait-on/wait-off
    pub state: String,
    pub is_on: bool,
    pub available: bool,
    pub unit_type: Option<String>,
    pub exit_code: Option<i32>,
    pub last_activity: Option<String>,
    pub triggered_by: Option<String>,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    /// Success with no data
    Ok,
    /// Unit is not tracked; nothing was done
    Skipped,
    /// Tracked units
    Units(Vec<UnitInfo>),
    /// Single unit status
    Status(UnitInfo),
    /// Enabled state (enabled, disabled, static, etc.)
    EnabledState(String),
    /// A refresh was dropped because a pass is already running
    Busy,
    /// Error with message
    Error(String),
    /// Pong (response to ping)
    Pong,
}
