//! Derived getters over GetAll property bags
//!
//! A missing or mistyped property is logged and yields `None`.

use chrono::{DateTime, Utc};

use crate::dbus::{BusError, Properties};

fn report<T>(result: Result<T, BusError>) -> Option<T> {
    result
        .map_err(|e| log::error!("Service manager (D-Bus): {}", e))
        .ok()
}

/// Unit.ActiveState: "active", "inactive", "failed", ...
pub fn active_state(props: &Properties) -> Option<String> {
    report(props.string("ActiveState").map(str::to_owned))
}

/// Service.ExecMainStatus
pub fn exec_status(props: &Properties) -> Option<i32> {
    report(props.i32("ExecMainStatus"))
}

/// Service.Type: "simple", "forking", "oneshot", "notify", ...
pub fn unit_type(props: &Properties) -> Option<String> {
    report(props.string("Type").map(str::to_owned))
}

/// Service.Result: "success", "exit-code", "timeout", ...
pub fn result(props: &Properties) -> Option<String> {
    report(props.string("Result").map(str::to_owned))
}

/// Unit.StateChangeTimestamp rendered as UTC date-time
pub fn last_activity(props: &Properties) -> Option<String> {
    report(props.u64("StateChangeTimestamp")).and_then(format_timestamp)
}

/// Unit.TriggeredBy joined with ", "
pub fn triggered_by(props: &Properties) -> Option<String> {
    report(props.string_list("TriggeredBy")).map(|units| units.join(", "))
}

/// Microseconds since the epoch as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_timestamp(micros: u64) -> Option<String> {
    let secs = i64::try_from(micros / 1_000_000).ok()?;
    let nanos = u32::try_from((micros % 1_000_000) * 1_000).ok()?;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbus::PropertyValue;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0).unwrap(), "1970-01-01 00:00:00");
        assert_eq!(
            format_timestamp(1_700_000_000_123_456).unwrap(),
            "2023-11-14 22:13:20"
        );
    }

    #[test]
    fn test_getters() {
        let props = Properties::new()
            .with("ActiveState", PropertyValue::Str("failed".into()))
            .with("Type", PropertyValue::Str("oneshot".into()))
            .with("ExecMainStatus", PropertyValue::I32(203))
            .with("Result", PropertyValue::Str("exit-code".into()))
            .with(
                "TriggeredBy",
                PropertyValue::StrList(vec!["backup.timer".into(), "backup.path".into()]),
            )
            .with("StateChangeTimestamp", PropertyValue::U64(86_400_000_000));

        assert_eq!(active_state(&props).as_deref(), Some("failed"));
        assert_eq!(unit_type(&props).as_deref(), Some("oneshot"));
        assert_eq!(exec_status(&props), Some(203));
        assert_eq!(result(&props).as_deref(), Some("exit-code"));
        assert_eq!(
            triggered_by(&props).as_deref(),
            Some("backup.timer, backup.path")
        );
        assert_eq!(last_activity(&props).as_deref(), Some("1970-01-02 00:00:00"));
    }

    #[test]
    fn test_missing_properties_are_none() {
        let props = Properties::new();
        assert_eq!(active_state(&props), None);
        assert_eq!(exec_status(&props), None);
        assert_eq!(last_activity(&props), None);
        assert_eq!(triggered_by(&props), None);
    }

    #[test]
    fn test_empty_triggered_by() {
        let props = Properties::new().with("TriggeredBy", PropertyValue::StrList(vec![]));
        assert_eq!(triggered_by(&props).as_deref(), Some(""));
    }
}
