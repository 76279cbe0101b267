use btleplug::platform::Peripheral;

#[derive(Debug, Clone)]
pub enum DeviceEvent {
    // a peripheral advertising this local name was discovered by the continuous scan
    NameObserved(String),
    ScanError(String),
}

#[derive(Debug, Clone)]
pub struct ConnectedDevice {
    pub name: String,
    pub peripheral: Peripheral,
}
