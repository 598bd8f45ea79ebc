//! D-Bus access to the systemd service manager
//!
//! [`SystemdBus`] is the raw RPC surface consumed from org.freedesktop.systemd1:
//! - Manager: ListUnits, LoadUnit, StartUnit, StopUnit, RestartUnit
//! - Manager: EnableUnitFiles, DisableUnitFiles, GetUnitFileState
//! - Properties: GetAll on the Unit and Service interfaces
//!
//! [`DbusBus`] implements it over zbus. Errors surface here as [`BusError`];
//! the [`crate::manager::ServiceManagerClient`] turns them into sentinels.

mod bus;
#[cfg(test)]
pub(crate) mod fake;
mod properties;

pub use bus::DbusBus;
pub use properties::{Properties, PropertyValue};

use std::future::Future;

use crate::manager::Mode;

pub const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
pub const SYSTEMD_MANAGER_PATH: &str = "/org/freedesktop/systemd1";
pub const SYSTEMD_MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
pub const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";
pub const SERVICE_INTERFACE: &str = "org.freedesktop.systemd1.Service";

/// Failures talking to the service manager
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("cannot reach service manager: {0}")]
    ConnectionFailed(String),

    #[error("{method}({unit}) failed: {reason}")]
    CallFailed {
        method: &'static str,
        unit: String,
        reason: String,
    },

    #[error("property {0} missing")]
    PropertyMissing(String),
}

impl BusError {
    pub fn call_failed(method: &'static str, unit: &str, reason: impl ToString) -> Self {
        Self::CallFailed {
            method,
            unit: unit.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Property set selected for GetAll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyInterface {
    /// Generic unit properties (ActiveState, StateChangeTimestamp, TriggeredBy, ...)
    Unit,
    /// Service-specific properties (Type, ExecMainStatus, Result, ...)
    Service,
}

impl PropertyInterface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => UNIT_INTERFACE,
            Self::Service => SERVICE_INTERFACE,
        }
    }
}

/// The columns of a ListUnits row that reconciliation consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedUnit {
    pub name: String,
    /// Low-level state, e.g. "running", "exited", "dead"
    pub sub_state: String,
}

impl ListedUnit {
    pub fn new(name: impl Into<String>, sub_state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_state: sub_state.into(),
        }
    }
}

/// Raw RPC surface of the service manager.
///
/// Every call is independent: nothing is queued and nothing is retried.
pub trait SystemdBus: Send + Sync + 'static {
    fn list_units(&self) -> impl Future<Output = Result<Vec<ListedUnit>, BusError>> + Send;

    fn start_unit(
        &self,
        name: &str,
        mode: Mode,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn stop_unit(
        &self,
        name: &str,
        mode: Mode,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn restart_unit(
        &self,
        name: &str,
        mode: Mode,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// runtime=false, force=true
    fn enable_unit_files(
        &self,
        names: &[&str],
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn disable_unit_files(
        &self,
        names: &[&str],
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn unit_file_state(&self, name: &str) -> impl Future<Output = Result<String, BusError>> + Send;

    /// LoadUnit followed by Properties.GetAll on the unit's object path
    fn get_all(
        &self,
        name: &str,
        interface: PropertyInterface,
    ) -> impl Future<Output = Result<Properties, BusError>> + Send;
}
