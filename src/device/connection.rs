use std::collections::BTreeSet;
use std::future::Future;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, Service};
use btleplug::platform::{Adapter, Manager, Peripheral};
use log::{debug, info, warn};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::types::Config;
use crate::device::constants::{DISCONNECT_DEADLINE, POLL_DELAY};
use crate::device::decode::decode_value;
use crate::device::types::ConnectedDevice;
use crate::error::DeviceError;

/// Runs `start` on every item in order. When one fails, `stop` is given the items that were
/// already started before the error is returned.
pub async fn start_all<'a, A, T, E, S, SF, P, PF>(items: &'a [A], mut start: S, stop: P) -> Result<Vec<T>, E>
where
    S: FnMut(usize, &'a A) -> SF,
    SF: Future<Output = Result<T, E>>,
    P: FnOnce(&'a [A]) -> PF,
    PF: Future<Output = ()>,
{
    let mut started = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match start(index, item).await {
            Ok(value) => started.push(value),
            Err(err) => {
                stop(&items[..index]).await;
                return Err(err);
            },
        }
    }

    Ok(started)
}

/// Awaits `step`. When it fails, the future made by `cleanup` runs before the error is returned.
pub async fn cleanup_on_error<T, E, F, C, CF>(step: F, cleanup: C) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    C: FnOnce() -> CF,
    CF: Future<Output = ()>,
{
    match step.await {
        Ok(value) => Ok(value),
        Err(err) => {
            cleanup().await;
            Err(err)
        },
    }
}

async fn start_adapter_scan(adapter: &Adapter) -> Result<(), DeviceError> {
    info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
    adapter.start_scan(ScanFilter::default()).await?;
    Ok(())
}

async fn start_scanning(manager: &Manager) -> Result<Vec<Adapter>, DeviceError> {
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(DeviceError::NoAdapter);
    }

    start_all(&adapters, |_, adapter| start_adapter_scan(adapter), stop_scanning).await?;
    Ok(adapters)
}

pub(crate) async fn stop_scanning(adapters: &[Adapter]) {
    for adapter in adapters {
        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop scanning: {}", err);
        }
    }
}

pub fn name_matches(local_name: Option<&str>, device_name: &str) -> bool {
    local_name == Some(device_name)
}

async fn find_peripheral(adapters: &[Adapter], device_name: &str) -> Result<Option<(Peripheral, String)>, DeviceError> {
    for adapter in adapters {
        let peripherals = match adapter.peripherals().await {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to query BLE adapter for peripherals: {}", err);
                continue;
            },
        };

        for peripheral in peripherals {
            match peripheral.properties().await {
                Err(err) => {
                    warn!("Could not query peripheral for properties: {:?}", err);
                },
                Ok(None) => {},
                Ok(Some(properties)) => {
                    if name_matches(properties.local_name.as_deref(), device_name) {
                        info!(
                            "Using peripheral {} {:?} {}",
                            properties.address,
                            properties.address_type,
                            device_name,
                        );
                        return Ok(Some((peripheral, device_name.to_string())));
                    }
                },
            }
        }
    }

    Ok(None)
}

/// Scans until a peripheral advertising `config.device_name` shows up, then stops scanning,
/// connects and discovers all of its services and characteristics.
///
/// There is no timeout: this only gives up when `cancel` is cancelled, in which case `None` is
/// returned.
pub async fn scan_and_connect(cancel: CancellationToken, config: Config) -> Result<Option<ConnectedDevice>, DeviceError> {
    let manager = Manager::new().await?;
    let adapters = start_scanning(&manager).await?;

    let found = loop {
        let found = match find_peripheral(&adapters, &config.device_name).await {
            Ok(found) => found,
            Err(err) => {
                stop_scanning(&adapters).await;
                return Err(err);
            },
        };

        if let Some(found) = found {
            break found;
        }

        debug!("No peripheral named {} yet", config.device_name);

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Scan & connect cancelled");
                stop_scanning(&adapters).await;
                return Ok(None);
            },
            _ = sleep(Duration::from_millis(POLL_DELAY)) => {},
        }
    };

    stop_scanning(&adapters).await;

    let (peripheral, name) = found;

    info!("Connecting to peripheral...");
    peripheral.connect().await?;

    let device = ConnectedDevice { name, peripheral };

    info!("Connected; Discovering services...");
    // nothing keeps track of this link once the error is returned, so drop it here
    cleanup_on_error(
        device.peripheral.discover_services(),
        || disconnect(device.clone()),
    ).await?;

    Ok(Some(device))
}

pub fn find_characteristic(services: &BTreeSet<Service>, service_uuid: Uuid, characteristic_uuid: Uuid) -> Option<Characteristic> {
    services
        .iter()
        .filter(|service| service.uuid == service_uuid)
        .flat_map(|service| service.characteristics.iter())
        .find(|characteristic| characteristic.uuid == characteristic_uuid)
        .cloned()
}

/// Reads the configured characteristic and decodes it as text. `None` means the peripheral
/// returned an empty value.
pub async fn read_value(device: &ConnectedDevice, config: &Config) -> Result<Option<String>, DeviceError> {
    let characteristic = find_characteristic(
        &device.peripheral.services(),
        config.service_uuid,
        config.characteristic_uuid,
    ).ok_or(DeviceError::MissingCharacteristic)?;

    info!("Reading characteristic {:?} {:?}", characteristic.service_uuid, characteristic.uuid);
    let value = device.peripheral.read(&characteristic).await?;

    Ok(decode_value(&value, config.encoding)?)
}

pub async fn disconnect(device: ConnectedDevice) {
    info!("Disconnecting from {}", device.name);

    tokio::select! {
        _ = sleep(Duration::from_millis(DISCONNECT_DEADLINE)) => {
            warn!("Disconnecting from peripheral took too long");
        }
        result = device.peripheral.disconnect() => {
            if let Err(err) = result {
                warn!("Failed to disconnect from peripheral: {}", err);
            }
        }
    };
}
