use btleplug::api::Manager as _;
use btleplug::platform::Manager;
use log::{info, warn};

use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    FineLocation,
    BluetoothScan,
    BluetoothConnect,
}

pub const REQUIRED_PERMISSIONS: [Permission; 3] = [
    Permission::FineLocation,
    Permission::BluetoothScan,
    Permission::BluetoothConnect,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    // the bluetooth stack could not be reached, so nothing could be granted
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionReport {
    results: Vec<(Permission, PermissionStatus)>,
}

impl PermissionReport {
    pub fn new(results: Vec<(Permission, PermissionStatus)>) -> Self {
        PermissionReport { results }
    }

    /// Desktop hosts grant bluetooth access to the whole process, so a single probe decides the
    /// scan and connect permissions together. Location is not a separate permission there.
    pub fn from_probe(probe: &Result<usize, DeviceError>) -> Self {
        let bluetooth = match probe {
            Ok(_) => PermissionStatus::Granted,
            Err(err) if err.is_permission_denied() => PermissionStatus::Denied,
            Err(_) => PermissionStatus::Unavailable,
        };

        let results = REQUIRED_PERMISSIONS
            .iter()
            .map(|permission| match permission {
                Permission::FineLocation => (*permission, PermissionStatus::Granted),
                _ => (*permission, bluetooth),
            })
            .collect();

        PermissionReport { results }
    }

    pub fn status(&self, permission: Permission) -> Option<PermissionStatus> {
        self.results
            .iter()
            .find(|(p, _)| *p == permission)
            .map(|(_, status)| *status)
    }

    pub fn all_granted(&self) -> bool {
        REQUIRED_PERMISSIONS
            .iter()
            .all(|permission| self.status(*permission) == Some(PermissionStatus::Granted))
    }

    pub fn any_denied(&self) -> bool {
        self.results.iter().any(|(_, status)| *status == PermissionStatus::Denied)
    }
}

async fn probe_bluetooth_access() -> Result<usize, DeviceError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    Ok(adapters.len())
}

/// Requests the bluetooth permissions once. The outcome is only reported: nothing is gated on it.
pub async fn request_permissions() -> PermissionReport {
    let probe = probe_bluetooth_access().await;

    match &probe {
        Ok(count) => info!("Bluetooth available, {} adapter(s)", count),
        Err(err) => warn!("Bluetooth access probe failed: {}", err),
    }

    let report = PermissionReport::from_probe(&probe);
    if !report.all_granted() {
        warn!("Bluetooth permissions not granted: {:?}", report);
    }
    report
}
