use std::collections::HashSet;
use std::convert::Infallible;
use std::hash::Hash;
use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use futures::stream::select_all;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use iced::subscription::{self, Subscription};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::device::connection::{start_all, stop_scanning};
use crate::device::types::DeviceEvent;
use crate::error::DeviceError;

async fn send_event(sender: &mut Sender<DeviceEvent>, event: DeviceEvent) {
    if let Err(err) = sender.send(event).await {
        warn!("Failed to send DeviceEvent: {}", err);
    }
}

async fn peripheral_name(adapter: &Adapter, id: &PeripheralId) -> Result<Option<String>, DeviceError> {
    let peripheral = adapter.peripheral(id).await?;
    let properties = peripheral.properties().await?;
    Ok(properties.and_then(|properties| properties.local_name))
}

/// Remembers which peripherals were already reported with a name.
///
/// A peripheral often advertises without its name first and only later, in a scan response,
/// with it. Each peripheral is reported once: the first time a name is known for it.
#[derive(Debug)]
pub struct NamedSightings<K> {
    named: HashSet<K>,
}

impl<K: Eq + Hash> NamedSightings<K> {
    pub fn new() -> Self {
        NamedSightings { named: HashSet::new() }
    }

    pub fn is_named(&self, key: &K) -> bool {
        self.named.contains(key)
    }

    /// Returns the name to report, if this is the first sighting of `key` that carries one.
    pub fn observe(&mut self, key: K, name: Option<String>) -> Option<String> {
        let name = name?;
        if self.named.insert(key) {
            Some(name)
        } else {
            None
        }
    }
}

async fn start_adapter(adapter: &Adapter, index: usize) -> Result<impl futures::Stream<Item = (usize, CentralEvent)>, DeviceError> {
    info!("Continuous scan using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
    // subscribe before scanning so that no discovery is missed
    let events = adapter.events().await?;
    adapter.start_scan(ScanFilter::default()).await?;
    Ok(events.map(move |event| (index, event)))
}

/// Scans on every adapter and reports the local name of every discovered peripheral, until
/// `cancel` is cancelled.
async fn observe_names(cancel: &CancellationToken, sender: &mut Sender<DeviceEvent>) -> Result<(), DeviceError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(DeviceError::NoAdapter);
    }

    let streams = start_all(&adapters, |index, adapter| start_adapter(adapter, index), stop_scanning).await?;

    let mut events = select_all(streams.into_iter().map(Box::pin));
    let mut sightings = NamedSightings::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            },
            event = events.next() => match event {
                None => {
                    warn!("Adapter event streams ended");
                    break;
                },
                Some((index, CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id))) => {
                    let key = (index, id);
                    if sightings.is_named(&key) {
                        continue;
                    }

                    match peripheral_name(&adapters[index], &key.1).await {
                        Ok(name) => {
                            if let Some(name) = sightings.observe(key, name) {
                                send_event(sender, DeviceEvent::NameObserved(name)).await;
                            }
                        },
                        Err(err) => warn!("Could not query peripheral {:?} for its name: {}", key.1, err),
                    }
                },
                Some(_) => {},
            }
        }
    }

    stop_scanning(&adapters).await;
    Ok(())
}

async fn continuous_scan(cancel: CancellationToken, mut sender: Sender<DeviceEvent>) -> Infallible {
    if let Err(err) = observe_names(&cancel, &mut sender).await {
        error!("Scan error: {}", err);
        send_event(&mut sender, DeviceEvent::ScanError(err.to_string())).await;
    }

    info!("Continuous scan stopped");

    // subscription::channel expects the future to never resolve
    std::future::pending::<Infallible>().await
}

/// Runs one continuous scan for as long as the application lives.
pub fn continuous_scan_subscription(cancel: CancellationToken) -> Subscription<DeviceEvent> {
    struct ContinuousScan;

    subscription::channel(
        std::any::TypeId::of::<ContinuousScan>(),
        64,
        move |subscription_sender| continuous_scan(cancel, subscription_sender),
    )
}
