//! In-memory unit cache
//!
//! [`UnitRecord`] holds one unit's last observed state; [`UnitRegistry`]
//! keys records by unit name. Records are created on first sight and never
//! removed, only marked unavailable.

mod record;
mod registry;

pub use record::{UnitExtra, UnitRecord, ON_STATES, WAIT_OFF, WAIT_ON};
pub use registry::UnitRegistry;
