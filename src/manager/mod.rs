//! Service manager client
//!
//! Translates unit operations into [`SystemdBus`] calls. Failures never
//! cross this boundary: every error is logged and the call returns a
//! sentinel (`None` / `false`).

mod mode;
pub mod props;

pub use mode::{Mode, UnknownMode};

use std::collections::HashSet;
use std::sync::Arc;

use crate::dbus::{BusError, Properties, PropertyInterface, SystemdBus};

/// Only units with this suffix are eligible for tracking
pub const SERVICE_SUFFIX: &str = ".service";

fn report(result: Result<(), BusError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::error!("Service manager (D-Bus): {}", e);
            false
        }
    }
}

pub struct ServiceManagerClient<B> {
    bus: Arc<B>,
}

impl<B> Clone for ServiceManagerClient<B> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
        }
    }
}

impl<B: SystemdBus> ServiceManagerClient<B> {
    pub fn new(bus: B) -> Self {
        Self { bus: Arc::new(bus) }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Live `.service` units as (name, sub-state), in listing order.
    ///
    /// Duplicate names keep their first occurrence. `None` if the listing
    /// could not be fetched.
    pub async fn list_units(&self) -> Option<Vec<(String, String)>> {
        let units = match self.bus.list_units().await {
            Ok(units) => units,
            Err(e) => {
                log::error!("Service manager (D-Bus): {}", e);
                return None;
            }
        };

        let mut seen = HashSet::new();
        let mut services = Vec::new();
        for unit in units {
            let name = unit.name.trim();
            if !name.ends_with(SERVICE_SUFFIX) {
                log::debug!("Ignoring non-service unit {}", name);
                continue;
            }
            if !seen.insert(name.to_string()) {
                log::debug!("Dropping duplicate unit {} ({})", name, unit.sub_state);
                continue;
            }
            services.push((name.to_string(), unit.sub_state));
        }
        Some(services)
    }

    pub async fn start(&self, name: &str, mode: Mode) -> bool {
        report(self.bus.start_unit(name, mode).await)
    }

    pub async fn stop(&self, name: &str, mode: Mode) -> bool {
        report(self.bus.stop_unit(name, mode).await)
    }

    pub async fn restart(&self, name: &str, mode: Mode) -> bool {
        report(self.bus.restart_unit(name, mode).await)
    }

    /// Enable the unit file. Does not start the unit.
    pub async fn enable(&self, name: &str) -> bool {
        report(self.bus.enable_unit_files(&[name]).await)
    }

    /// Disable the unit file. A running unit keeps running.
    pub async fn disable(&self, name: &str) -> bool {
        report(self.bus.disable_unit_files(&[name]).await)
    }

    pub async fn get_unit_properties(
        &self,
        name: &str,
        interface: PropertyInterface,
    ) -> Option<Properties> {
        match self.bus.get_all(name, interface).await {
            Ok(props) => Some(props),
            Err(e) => {
                log::error!("Service manager (D-Bus): {}", e);
                None
            }
        }
    }

    /// "enabled", "disabled", "static", "masked", ...
    pub async fn unit_file_state(&self, name: &str) -> Option<String> {
        match self.bus.unit_file_state(name).await {
            Ok(state) => Some(state),
            Err(e) => {
                log::error!("Service manager (D-Bus): {}", e);
                None
            }
        }
    }

    /// Whether a unit file exists for `name`
    pub async fn is_installed(&self, name: &str) -> bool {
        match self.bus.unit_file_state(name).await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("{} not installed: {}", name, e);
                false
            }
        }
    }

    pub async fn active_state(&self, name: &str) -> Option<String> {
        let props = self
            .get_unit_properties(name, PropertyInterface::Unit)
            .await?;
        props::active_state(&props)
    }

    pub async fn is_active(&self, name: &str) -> bool {
        self.active_state(name).await.as_deref() == Some("active")
    }

    pub async fn is_failed(&self, name: &str) -> bool {
        self.active_state(name).await.as_deref() == Some("failed")
    }

    /// ExecMainStatus of the service's main process
    pub async fn exit_code(&self, name: &str) -> Option<i32> {
        let props = self
            .get_unit_properties(name, PropertyInterface::Service)
            .await?;
        props::exec_status(&props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbus::fake::{Call, FakeBus};
    use crate::dbus::PropertyValue;

    fn client() -> ServiceManagerClient<FakeBus> {
        ServiceManagerClient::new(FakeBus::new())
    }

    #[tokio::test]
    async fn test_list_filters_services() {
        let client = client();
        client.bus().set_listing(&[
            ("nginx.service", "running"),
            ("dbus.socket", "listening"),
            ("-.mount", "mounted"),
            ("  sshd.service ", "dead"),
        ]);

        let units = client.list_units().await.unwrap();
        assert_eq!(
            units,
            vec![
                ("nginx.service".to_string(), "running".to_string()),
                ("sshd.service".to_string(), "dead".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_first_duplicate_wins() {
        let client = client();
        client
            .bus()
            .set_listing(&[("nginx.service", "running"), ("nginx.service", "dead")]);

        let units = client.list_units().await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].1, "running");
    }

    #[tokio::test]
    async fn test_list_failure_is_none() {
        let client = client();
        client.bus().fail_listing();
        assert!(client.list_units().await.is_none());
    }

    #[tokio::test]
    async fn test_jobs_pass_mode() {
        let client = client();
        assert!(client.start("a.service", Mode::Fail).await);
        assert!(client.stop("a.service", Mode::Replace).await);
        assert!(client.restart("a.service", Mode::IgnoreDependencies).await);
        assert_eq!(
            client.bus().calls(),
            vec![
                Call::Start("a.service".into(), Mode::Fail),
                Call::Stop("a.service".into(), Mode::Replace),
                Call::Restart("a.service".into(), Mode::IgnoreDependencies),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_calls_return_false() {
        let client = client();
        client.bus().fail_jobs(true);
        assert!(!client.start("a.service", Mode::Replace).await);
        assert!(!client.enable("a.service").await);
        assert!(!client.disable("a.service").await);
    }

    #[tokio::test]
    async fn test_active_state_queries() {
        let client = client();
        client.bus().set_properties(
            "a.service",
            PropertyInterface::Unit,
            Properties::new().with("ActiveState", PropertyValue::Str("failed".into())),
        );

        assert!(client.is_failed("a.service").await);
        assert!(!client.is_active("a.service").await);
        // Unknown unit: properties unavailable
        assert!(!client.is_active("b.service").await);
    }

    #[tokio::test]
    async fn test_unit_file_state() {
        let client = client();
        client.bus().set_file_state("a.service", "enabled");
        assert_eq!(client.unit_file_state("a.service").await.as_deref(), Some("enabled"));
        assert!(client.is_installed("a.service").await);
        assert!(!client.is_installed("b.service").await);
        assert_eq!(client.unit_file_state("b.service").await, None);
    }

    #[tokio::test]
    async fn test_exit_code() {
        let client = client();
        client.bus().set_properties(
            "a.service",
            PropertyInterface::Service,
            Properties::new().with("ExecMainStatus", PropertyValue::I32(1)),
        );
        assert_eq!(client.exit_code("a.service").await, Some(1));
        assert_eq!(client.exit_code("b.service").await, None);
    }
}
