//! Scripted in-memory [`SystemdBus`] for unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use super::{BusError, ListedUnit, Properties, PropertyInterface, SystemdBus};
use crate::manager::Mode;

/// A recorded bus call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListUnits,
    Start(String, Mode),
    Stop(String, Mode),
    Restart(String, Mode),
    Enable(String),
    Disable(String),
    UnitFileState(String),
    GetAll(String, PropertyInterface),
}

#[derive(Default)]
struct State {
    /// `None` makes ListUnits fail
    listing: Option<Vec<ListedUnit>>,
    properties: HashMap<(String, PropertyInterface), Properties>,
    file_states: HashMap<String, String>,
    fail_jobs: bool,
    calls: Vec<Call>,
    entered: Option<Arc<Notify>>,
    gate: Option<Arc<Notify>>,
    job_entered: Option<Arc<Notify>>,
    job_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct FakeBus {
    state: Mutex<State>,
}

impl FakeBus {
    pub fn new() -> Self {
        let bus = Self::default();
        bus.set_listing(&[]);
        bus
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_listing(&self, units: &[(&str, &str)]) {
        self.lock().listing = Some(
            units
                .iter()
                .map(|(name, sub)| ListedUnit::new(*name, *sub))
                .collect(),
        );
    }

    pub fn fail_listing(&self) {
        self.lock().listing = None;
    }

    pub fn set_properties(&self, name: &str, interface: PropertyInterface, props: Properties) {
        self.lock()
            .properties
            .insert((name.to_string(), interface), props);
    }

    pub fn set_file_state(&self, name: &str, state: &str) {
        self.lock()
            .file_states
            .insert(name.to_string(), state.to_string());
    }

    /// Make every job and unit-file call fail with CallFailed
    pub fn fail_jobs(&self, fail: bool) {
        self.lock().fail_jobs = fail;
    }

    /// Park ListUnits until the returned gate is notified. `entered` is
    /// notified when a caller reaches the gate.
    pub fn hold_listing(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let mut state = self.lock();
        state.entered = Some(Arc::clone(&entered));
        state.gate = Some(Arc::clone(&gate));
        (entered, gate)
    }

    /// Park the next start/stop/restart/enable/disable call the same way
    pub fn hold_jobs(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let mut state = self.lock();
        state.job_entered = Some(Arc::clone(&entered));
        state.job_gate = Some(Arc::clone(&gate));
        (entered, gate)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of GetAll calls issued for `name`
    pub fn property_fetches(&self, name: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::GetAll(n, _) if n == name))
            .count()
    }

    async fn job(&self, call: Call, method: &'static str, name: &str) -> Result<(), BusError> {
        let (entered, gate, fail) = {
            let mut state = self.lock();
            state.calls.push(call);
            (state.job_entered.take(), state.job_gate.take(), state.fail_jobs)
        };
        if let Some(entered) = entered {
            entered.notify_one();
        }
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if fail {
            return Err(BusError::call_failed(method, name, "rejected"));
        }
        Ok(())
    }
}

impl SystemdBus for FakeBus {
    async fn list_units(&self) -> Result<Vec<ListedUnit>, BusError> {
        let (entered, gate) = {
            let mut state = self.lock();
            state.calls.push(Call::ListUnits);
            (state.entered.take(), state.gate.take())
        };
        if let Some(entered) = entered {
            entered.notify_one();
        }
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.lock()
            .listing
            .clone()
            .ok_or_else(|| BusError::ConnectionFailed("bus unavailable".into()))
    }

    async fn start_unit(&self, name: &str, mode: Mode) -> Result<(), BusError> {
        self.job(Call::Start(name.into(), mode), "StartUnit", name).await
    }

    async fn stop_unit(&self, name: &str, mode: Mode) -> Result<(), BusError> {
        self.job(Call::Stop(name.into(), mode), "StopUnit", name).await
    }

    async fn restart_unit(&self, name: &str, mode: Mode) -> Result<(), BusError> {
        self.job(Call::Restart(name.into(), mode), "RestartUnit", name).await
    }

    async fn enable_unit_files(&self, names: &[&str]) -> Result<(), BusError> {
        let name = names.join(" ");
        self.job(Call::Enable(name.clone()), "EnableUnitFiles", &name).await
    }

    async fn disable_unit_files(&self, names: &[&str]) -> Result<(), BusError> {
        let name = names.join(" ");
        self.job(Call::Disable(name.clone()), "DisableUnitFiles", &name).await
    }

    async fn unit_file_state(&self, name: &str) -> Result<String, BusError> {
        let mut state = self.lock();
        state.calls.push(Call::UnitFileState(name.into()));
        state
            .file_states
            .get(name)
            .cloned()
            .ok_or_else(|| BusError::call_failed("GetUnitFileState", name, "No such file"))
    }

    async fn get_all(
        &self,
        name: &str,
        interface: PropertyInterface,
    ) -> Result<Properties, BusError> {
        let mut state = self.lock();
        state.calls.push(Call::GetAll(name.into(), interface));
        state
            .properties
            .get(&(name.to_string(), interface))
            .cloned()
            .ok_or_else(|| BusError::call_failed("LoadUnit", name, "Unit not loaded"))
    }
}
