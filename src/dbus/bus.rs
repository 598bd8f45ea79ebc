//! zbus implementation of [`SystemdBus`]

use std::collections::HashMap;

use zbus::{
    zvariant::{OwnedObjectPath, OwnedValue, Value},
    Connection, Proxy,
};

use super::{
    BusError, ListedUnit, Properties, PropertyInterface, PropertyValue, SystemdBus,
    SYSTEMD_DESTINATION, SYSTEMD_MANAGER_INTERFACE, SYSTEMD_MANAGER_PATH,
};
use crate::manager::Mode;

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// ListUnits row: name, description, load, active, sub, following,
/// unit path, job id, job type, job path
type RawUnit = (
    String,
    String,
    String,
    String,
    String,
    String,
    OwnedObjectPath,
    u32,
    String,
    OwnedObjectPath,
);

/// Changes reported by Enable/DisableUnitFiles: (type, symlink, destination)
type UnitFileChange = (String, String, String);

/// Client handle on the system (or session) bus
#[derive(Clone)]
pub struct DbusBus {
    connection: Connection,
}

impl DbusBus {
    /// Connect to the system bus
    pub async fn system() -> Result<Self, BusError> {
        let connection = Connection::system()
            .await
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        Ok(Self { connection })
    }

    /// Connect to the session bus (user service manager)
    pub async fn session() -> Result<Self, BusError> {
        let connection = Connection::session()
            .await
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        Ok(Self { connection })
    }

    async fn manager(&self) -> Result<Proxy<'static>, BusError> {
        Proxy::new(
            &self.connection,
            SYSTEMD_DESTINATION,
            SYSTEMD_MANAGER_PATH,
            SYSTEMD_MANAGER_INTERFACE,
        )
        .await
        .map_err(|e| BusError::ConnectionFailed(e.to_string()))
    }

    /// Queue a start/stop/restart job. The job path is not tracked.
    async fn job(&self, method: &'static str, name: &str, mode: Mode) -> Result<(), BusError> {
        let manager = self.manager().await?;
        let _job: OwnedObjectPath = manager
            .call(method, &(name, mode.as_str()))
            .await
            .map_err(|e| BusError::call_failed(method, name, e))?;
        log::debug!("{} {} mode={}", method, name, mode);
        Ok(())
    }
}

impl SystemdBus for DbusBus {
    async fn list_units(&self) -> Result<Vec<ListedUnit>, BusError> {
        let manager = self.manager().await?;
        let units: Vec<RawUnit> = manager
            .call("ListUnits", &())
            .await
            .map_err(|e| BusError::call_failed("ListUnits", "", e))?;

        Ok(units
            .into_iter()
            .map(|(name, _, _, _, sub_state, ..)| ListedUnit { name, sub_state })
            .collect())
    }

    async fn start_unit(&self, name: &str, mode: Mode) -> Result<(), BusError> {
        self.job("StartUnit", name, mode).await
    }

    async fn stop_unit(&self, name: &str, mode: Mode) -> Result<(), BusError> {
        self.job("StopUnit", name, mode).await
    }

    async fn restart_unit(&self, name: &str, mode: Mode) -> Result<(), BusError> {
        self.job("RestartUnit", name, mode).await
    }

    async fn enable_unit_files(&self, names: &[&str]) -> Result<(), BusError> {
        let manager = self.manager().await?;
        // runtime=false, force=true
        let (_carries_install_info, changes): (bool, Vec<UnitFileChange>) = manager
            .call("EnableUnitFiles", &(names.to_vec(), false, true))
            .await
            .map_err(|e| BusError::call_failed("EnableUnitFiles", &names.join(" "), e))?;
        for (kind, link, target) in &changes {
            log::info!("EnableUnitFiles: {} {} -> {}", kind, link, target);
        }
        Ok(())
    }

    async fn disable_unit_files(&self, names: &[&str]) -> Result<(), BusError> {
        let manager = self.manager().await?;
        // runtime=false
        let changes: Vec<UnitFileChange> = manager
            .call("DisableUnitFiles", &(names.to_vec(), false))
            .await
            .map_err(|e| BusError::call_failed("DisableUnitFiles", &names.join(" "), e))?;
        for (kind, link, _) in &changes {
            log::info!("DisableUnitFiles: {} {}", kind, link);
        }
        Ok(())
    }

    async fn unit_file_state(&self, name: &str) -> Result<String, BusError> {
        let manager = self.manager().await?;
        manager
            .call("GetUnitFileState", &(name,))
            .await
            .map_err(|e| BusError::call_failed("GetUnitFileState", name, e))
    }

    async fn get_all(
        &self,
        name: &str,
        interface: PropertyInterface,
    ) -> Result<Properties, BusError> {
        let manager = self.manager().await?;
        let unit_path: OwnedObjectPath = manager
            .call("LoadUnit", &(name,))
            .await
            .map_err(|e| BusError::call_failed("LoadUnit", name, e))?;

        let properties = Proxy::new(
            &self.connection,
            SYSTEMD_DESTINATION,
            unit_path.as_str(),
            PROPERTIES_INTERFACE,
        )
        .await
        .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;

        let values: HashMap<String, OwnedValue> = properties
            .call("GetAll", &(interface.as_str(),))
            .await
            .map_err(|e| BusError::call_failed("GetAll", name, e))?;

        Ok(values
            .into_iter()
            .map(|(key, value)| (key, convert_value(&value)))
            .collect())
    }
}

fn convert_value(value: &Value<'_>) -> PropertyValue {
    match value {
        Value::Str(s) => PropertyValue::Str(s.to_string()),
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::I32(n) => PropertyValue::I32(*n),
        Value::U32(n) => PropertyValue::U32(*n),
        Value::U64(n) => PropertyValue::U64(*n),
        Value::Array(arr) => PropertyValue::StrList(
            arr.iter()
                .filter_map(|v| match v {
                    Value::Str(s) => Some(s.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        _ => PropertyValue::Other,
    }
}
