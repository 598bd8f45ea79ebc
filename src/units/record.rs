//! Last observed state of one service unit

use crate::dbus::{PropertyInterface, SystemdBus};
use crate::manager::{props, Mode, ServiceManagerClient};
use crate::protocol::UnitInfo;

/// Raw states that count as "on". "wait-on" is the synthetic state set by a
/// user toggle while the start job is in flight.
pub const ON_STATES: [&str; 3] = ["running", "start", "wait-on"];

pub const WAIT_ON: &str = "wait-on";
pub const WAIT_OFF: &str = "wait-off";

/// Properties derived from the Service and Unit interfaces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitExtra {
    pub unit_type: Option<String>,
    pub exit_code: Option<i32>,
    pub last_activity: Option<String>,
    pub triggered_by: Option<String>,
}

impl UnitExtra {
    /// Fetch from the service manager. An interface that cannot be read
    /// leaves its fields empty.
    pub async fn fetch<B: SystemdBus>(name: &str, client: &ServiceManagerClient<B>) -> Self {
        let mut extra = Self::default();

        if let Some(service) = client
            .get_unit_properties(name, PropertyInterface::Service)
            .await
        {
            extra.unit_type = props::unit_type(&service);
            extra.exit_code = props::exec_status(&service);
        }

        if let Some(unit) = client
            .get_unit_properties(name, PropertyInterface::Unit)
            .await
        {
            extra.last_activity = props::last_activity(&unit);
            extra.triggered_by = props::triggered_by(&unit);
        }

        extra
    }
}

#[derive(Debug, Clone)]
pub struct UnitRecord {
    name: String,
    raw_state: String,
    is_available: bool,
    /// Set while a user-initiated action is in flight
    pending_action: bool,
    extra: UnitExtra,
}

impl UnitRecord {
    /// Track a newly seen unit, fetching its extra properties right away
    pub async fn create<B: SystemdBus>(
        name: impl Into<String>,
        state: impl Into<String>,
        client: &ServiceManagerClient<B>,
    ) -> Self {
        let name = name.into();
        let extra = UnitExtra::fetch(&name, client).await;
        Self::with_extra(name, state, extra)
    }

    pub fn with_extra(name: impl Into<String>, state: impl Into<String>, extra: UnitExtra) -> Self {
        Self {
            name: name.into(),
            raw_state: state.into(),
            is_available: true,
            pending_action: false,
            extra,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_state(&self) -> &str {
        &self.raw_state
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn has_pending_action(&self) -> bool {
        self.pending_action
    }

    pub fn extra(&self) -> &UnitExtra {
        &self.extra
    }

    pub fn is_on(&self) -> bool {
        ON_STATES.contains(&self.raw_state.as_str())
    }

    /// Apply an observed (or requested, when `is_block`) state.
    ///
    /// An unflagged update arriving while an action is pending only clears
    /// the pending flag: that one observation predates the action.
    pub async fn update_state<B: SystemdBus>(
        &mut self,
        state: &str,
        is_block: bool,
        client: &ServiceManagerClient<B>,
    ) {
        // A unit coming back from unavailable starts fresh
        if !self.is_available {
            self.pending_action = false;
        }

        if self.pending_action && !is_block {
            self.pending_action = false;
            return;
        }

        if state != self.raw_state {
            self.extra = UnitExtra::fetch(&self.name, client).await;
        }

        self.raw_state = state.to_string();
        self.is_available = true;

        if is_block {
            self.pending_action = true;
        }
    }

    /// Mark stale. The last known state and extra stay readable.
    pub fn deactivate(&mut self) {
        self.is_available = false;
    }

    pub async fn request_start<B: SystemdBus>(
        &self,
        mode: Mode,
        client: &ServiceManagerClient<B>,
    ) -> bool {
        client.start(&self.name, mode).await
    }

    pub async fn request_stop<B: SystemdBus>(
        &self,
        mode: Mode,
        client: &ServiceManagerClient<B>,
    ) -> bool {
        client.stop(&self.name, mode).await
    }

    pub fn attributes(&self) -> UnitInfo {
        UnitInfo {
            name: self.name.clone(),
            state: self.raw_state.clone(),
            is_on: self.is_on(),
            available: self.is_available,
            unit_type: self.extra.unit_type.clone(),
            exit_code: self.extra.exit_code,
            last_activity: self.extra.last_activity.clone(),
            triggered_by: self.extra.triggered_by.clone(),
        }
    }
}
