//! unitsync - keep selected systemd units in sync
//!
//! Polls the systemd service manager over D-Bus and keeps an in-memory
//! record of each selected `.service` unit:
//! - Tracks running state, availability and derived properties
//! - Starts, stops, restarts, enables and disables tracked units
//! - Notifies subscribers after every reconciliation pass
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            unitsyncd  /  unitsyncctl             │
//! ├─────────────────────────────────────────────────┤
//! │  Worker (timer, reconcile, actions, notify)     │
//! ├─────────────────────────────────────────────────┤
//! │  UnitRegistry / UnitRecord                       │
//! ├─────────────────────────────────────────────────┤
//! │  ServiceManagerClient  ──►  SystemdBus (zbus)    │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dbus;
pub mod manager;
pub mod protocol;
pub mod units;
pub mod worker;

pub use config::Settings;
pub use dbus::{BusError, DbusBus, SystemdBus};
pub use manager::{Mode, ServiceManagerClient};
pub use units::{UnitExtra, UnitRecord, UnitRegistry};
pub use worker::{Action, ActionOutcome, Worker};
