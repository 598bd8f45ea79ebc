//! Reconciliation worker
//!
//! One pass per tick:
//!
//! ```text
//!   tick ──► busy? ──yes──► drop tick
//!              │ no
//!              ▼
//!          ListUnits (failure = empty listing)
//!              │
//!              ▼
//!   for each listed unit:
//!     not selected ─► deactivate if tracked
//!     selected     ─► update_state, or create + insert
//!              │
//!              ▼
//!   deactivate tracked units not seen this pass
//!              │
//!              ▼
//!   notify subscribers (once) ─► release
//! ```
//!
//! Passes never overlap: a tick that finds one running is dropped, not queued.

mod action;

pub use action::{Action, ActionOutcome};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify, RwLock};

use crate::config::Settings;
use crate::dbus::SystemdBus;
use crate::manager::{Mode, ServiceManagerClient};
use crate::protocol::UnitInfo;
use crate::units::{UnitRecord, UnitRegistry, WAIT_OFF, WAIT_ON};

/// Capacity of the update channel; slow subscribers see `Lagged`
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Releases the pass guard on drop
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Worker<B> {
    client: ServiceManagerClient<B>,
    registry: RwLock<UnitRegistry>,
    settings: RwLock<Settings>,
    busy: AtomicBool,
    updates: broadcast::Sender<()>,
    rearm: Notify,
}

impl<B: SystemdBus> Worker<B> {
    pub fn new(bus: B, settings: Settings) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            client: ServiceManagerClient::new(bus),
            registry: RwLock::new(UnitRegistry::new()),
            settings: RwLock::new(settings),
            busy: AtomicBool::new(false),
            updates,
            rearm: Notify::new(),
        }
    }

    pub fn client(&self) -> &ServiceManagerClient<B> {
        &self.client
    }

    /// One `()` per completed pass. Re-query the worker for values.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.updates.subscribe()
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Swap allow-list and interval; the timer restarts with the new interval
    pub async fn update_settings(&self, settings: Settings) {
        log::info!(
            "Tracking {} units every {}s",
            settings.services.len(),
            settings.scan_interval
        );
        *self.settings.write().await = settings;
        self.rearm.notify_one();
    }

    fn try_begin_pass(&self) -> Option<PassGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| PassGuard(&self.busy))
    }

    /// Run one reconciliation pass. Returns false if the tick was dropped
    /// because another pass is still running.
    pub async fn reconcile(&self) -> bool {
        let Some(_guard) = self.try_begin_pass() else {
            log::debug!("Reconciliation still running, dropping tick");
            return false;
        };

        let settings = self.settings.read().await.clone();

        // A failed listing cannot be told apart from an empty one
        let listed = self.client.list_units().await.unwrap_or_default();

        let mut registry = self.registry.write().await;
        let mut current = HashSet::new();

        for (name, state) in listed {
            if !settings.is_selected(&name) {
                if let Some(record) = registry.get_mut(&name) {
                    record.deactivate();
                }
                continue;
            }

            current.insert(name.clone());

            if let Some(record) = registry.get_mut(&name) {
                record.update_state(&state, false, &self.client).await;
                continue;
            }

            log::debug!("Tracking {} ({})", name, state);
            let record = UnitRecord::create(name, state, &self.client).await;
            registry.insert_if_absent(record);
        }

        for record in registry.all_mut() {
            if !current.contains(record.name()) {
                record.deactivate();
            }
        }
        drop(registry);

        // No subscribers is fine
        let _ = self.updates.send(());
        true
    }

    /// Drive passes forever: one immediately, then every `scan_interval`.
    /// [`Worker::update_settings`] restarts the wait.
    pub async fn run(self: Arc<Self>) {
        self.reconcile().await;
        loop {
            let interval = self.settings.read().await.interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.reconcile().await;
                }
                _ = self.rearm.notified() => {
                    log::debug!("Timer re-armed");
                }
            }
        }
    }

    /// Dispatch a lifecycle action for a tracked unit. Untracked names are
    /// skipped without contacting the service manager.
    ///
    /// The registry lock is released before the call goes out, so a slow job
    /// never holds up a pass.
    pub async fn perform(&self, action: Action, name: &str, mode: Option<Mode>) -> ActionOutcome {
        let mode = mode.unwrap_or_default();
        let Some(record) = self.registry.read().await.get(name).cloned() else {
            log::debug!("Skipping {} for untracked unit {}", action, name);
            return ActionOutcome::Skipped;
        };

        if action.takes_mode() {
            log::info!("{} {} mode={}", action, name, mode);
        } else {
            log::info!("{} {}", action, name);
        }
        let ok = match action {
            Action::Start => record.request_start(mode, &self.client).await,
            Action::Stop => record.request_stop(mode, &self.client).await,
            Action::Restart => self.client.restart(record.name(), mode).await,
            Action::Enable => self.client.enable(record.name()).await,
            Action::Disable => self.client.disable(record.name()).await,
        };
        ActionOutcome::from(ok)
    }

    /// User toggle on: show "wait-on" and hold it over the next stale
    /// observation, then start the unit
    pub async fn turn_on(&self, name: &str) -> ActionOutcome {
        self.toggle(name, true).await
    }

    /// User toggle off: show "wait-off", then stop the unit
    pub async fn turn_off(&self, name: &str) -> ActionOutcome {
        self.toggle(name, false).await
    }

    async fn toggle(&self, name: &str, on: bool) -> ActionOutcome {
        let record = {
            let mut registry = self.registry.write().await;
            let Some(record) = registry.get_mut(name) else {
                log::debug!("Skipping toggle for untracked unit {}", name);
                return ActionOutcome::Skipped;
            };
            let target = if on { WAIT_ON } else { WAIT_OFF };
            record.update_state(target, true, &self.client).await;
            record.clone()
        };

        let ok = if on {
            record.request_start(Mode::Replace, &self.client).await
        } else {
            record.request_stop(Mode::Replace, &self.client).await
        };
        ActionOutcome::from(ok)
    }

    /// Unit file state for any unit, tracked or not
    pub async fn is_enabled(&self, name: &str) -> Option<String> {
        self.client.unit_file_state(name).await
    }

    pub async fn unit(&self, name: &str) -> Option<UnitInfo> {
        self.registry.read().await.get(name).map(UnitRecord::attributes)
    }

    /// All tracked units, sorted by name
    pub async fn snapshot(&self) -> Vec<UnitInfo> {
        let mut units: Vec<UnitInfo> = self
            .registry
            .read()
            .await
            .all()
            .map(UnitRecord::attributes)
            .collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));
        units
    }
}
