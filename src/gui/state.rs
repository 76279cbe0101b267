use btleplug::api::Peripheral as _;
use log::info;

use crate::config::types::Config;
use crate::device::types::{ConnectedDevice, DeviceEvent};

/// Returns the previously held connection if it has to be disconnected now that `new_id` is
/// connected. Connecting again to the same peripheral reuses the link, so nothing is returned.
pub fn superseded<T, I, F>(previous: Option<T>, new_id: &I, id_of: F) -> Option<T>
where
    I: PartialEq,
    F: Fn(&T) -> I,
{
    previous.filter(|previous| id_of(previous) != *new_id)
}

/// Everything the screen shows about bluetooth. Lives as long as the window.
#[derive(Debug, Default)]
pub struct ScreenState {
    connected: Option<ConnectedDevice>,
    data: Option<String>,
    device_names: Vec<String>,
    errors: Vec<String>,
    pending_connects: usize,
    bluetooth_denied: bool,
}

impl ScreenState {
    pub fn connected(&self) -> Option<&ConnectedDevice> {
        self.connected.as_ref()
    }

    pub fn connected_name(&self) -> Option<&str> {
        self.connected.as_ref().map(|device| device.name.as_str())
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn device_names(&self) -> &[String] {
        &self.device_names
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_connecting(&self) -> bool {
        self.pending_connects > 0
    }

    pub fn bluetooth_denied(&self) -> bool {
        self.bluetooth_denied
    }

    pub fn set_bluetooth_denied(&mut self, denied: bool) {
        self.bluetooth_denied = denied;
    }

    pub fn apply_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::NameObserved(name) => self.device_names.push(name),
            DeviceEvent::ScanError(message) => self.errors.push(message),
        }
    }

    /// Returns the target of the scan-and-connect that the button press starts. Presses are not
    /// gated: every press starts another one.
    pub fn begin_scan_and_connect(&mut self, config: &Config) -> Config {
        self.pending_connects += 1;
        info!("Scan & connect to {} ({} running)", config.device_name, self.pending_connects);
        config.clone()
    }

    /// Stores a freshly connected device. Returns the device it replaces when that is a different
    /// peripheral, which the caller should disconnect.
    pub fn connect_complete(&mut self, device: Option<ConnectedDevice>) -> Option<ConnectedDevice> {
        self.pending_connects = self.pending_connects.saturating_sub(1);

        let device = device?;
        let new_id = device.peripheral.id();
        superseded(self.connected.replace(device), &new_id, |previous| previous.peripheral.id())
    }

    /// Lines shown right below the button, in display order.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(name) = self.connected_name() {
            lines.push(format!("Connected to: {}", name));
        }
        if let Some(data) = self.data() {
            lines.push(format!("Data: {}", data));
        }
        lines
    }

    pub fn read_complete(&mut self, value: Option<String>) {
        if let Some(value) = value {
            self.data = Some(value);
        }
    }

    pub fn take_connected(&mut self) -> Option<ConnectedDevice> {
        self.connected.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_names_are_appended_in_order_with_duplicates() {
        let mut state = ScreenState::default();

        for name in ["Thermo", "Beacon", "Thermo"] {
            state.apply_device_event(DeviceEvent::NameObserved(name.to_string()));
        }

        assert_eq!(state.device_names(), ["Thermo", "Beacon", "Thermo"]);
        assert!(state.errors().is_empty());
    }

    #[test]
    fn scan_errors_appear_in_the_error_list() {
        let mut state = ScreenState::default();

        state.apply_device_event(DeviceEvent::ScanError("No bluetooth adapter is available".to_string()));
        state.apply_device_event(DeviceEvent::ScanError("Bluetooth is powered off".to_string()));

        assert_eq!(state.errors(), ["No bluetooth adapter is available", "Bluetooth is powered off"]);
        assert!(state.device_names().is_empty());
    }

    #[test]
    fn button_press_targets_the_configured_device() {
        let mut state = ScreenState::default();
        let config = Config {
            device_name: "Thermo".to_string(),
            ..Config::default()
        };

        let target = state.begin_scan_and_connect(&config);

        assert_eq!(target, config);
        assert!(state.is_connecting());
    }

    #[test]
    fn target_does_not_follow_later_edits() {
        let mut state = ScreenState::default();
        let mut config = Config::default();

        let target = state.begin_scan_and_connect(&config);
        config.device_name = "Edited while scanning".to_string();
        config.encoding = crate::config::types::ValueEncoding::Base64;

        assert_eq!(target, Config::default());
    }

    #[test]
    fn presses_are_not_gated() {
        let mut state = ScreenState::default();
        let config = Config::default();

        state.begin_scan_and_connect(&config);
        state.begin_scan_and_connect(&config);
        state.connect_complete(None);
        assert!(state.is_connecting());

        state.connect_complete(None);
        assert!(!state.is_connecting());
    }

    #[test]
    fn connect_failure_leaves_state_untouched() {
        let mut state = ScreenState::default();
        state.apply_device_event(DeviceEvent::NameObserved("Thermo".to_string()));
        state.read_complete(Some("21.5".to_string()));
        state.begin_scan_and_connect(&Config::default());

        let replaced = state.connect_complete(None);

        assert!(replaced.is_none());
        assert!(state.connected().is_none());
        assert_eq!(state.data(), Some("21.5"));
        assert_eq!(state.device_names(), ["Thermo"]);
        assert!(state.errors().is_empty());
        assert!(!state.is_connecting());
    }

    #[test]
    fn failed_or_empty_reads_keep_the_previous_value() {
        let mut state = ScreenState::default();
        assert_eq!(state.data(), None);

        state.read_complete(Some("first".to_string()));
        state.read_complete(None);
        assert_eq!(state.data(), Some("first"));

        state.read_complete(Some("second".to_string()));
        assert_eq!(state.data(), Some("second"));
        assert!(state.errors().is_empty());
    }

    #[test]
    fn status_shows_only_what_is_known() {
        let mut state = ScreenState::default();
        assert!(state.status_lines().is_empty());

        state.apply_device_event(DeviceEvent::NameObserved("Thermo".to_string()));
        state.apply_device_event(DeviceEvent::ScanError("Bluetooth is powered off".to_string()));
        assert!(state.status_lines().is_empty());

        state.read_complete(Some("21.5".to_string()));
        assert_eq!(state.status_lines(), ["Data: 21.5"]);
    }

    #[test]
    fn reconnecting_to_the_same_peripheral_keeps_the_link() {
        let previous = Some(("Thermo", "aa:bb"));
        assert_eq!(superseded(previous, &"aa:bb", |(_, id)| *id), None);
    }

    #[test]
    fn connecting_to_another_peripheral_drops_the_previous_one() {
        let previous = Some(("Thermo", "aa:bb"));
        assert_eq!(superseded(previous, &"cc:dd", |(_, id)| *id), Some(("Thermo", "aa:bb")));
    }

    #[test]
    fn first_connection_supersedes_nothing() {
        let previous: Option<(&str, &str)> = None;
        assert_eq!(superseded(previous, &"aa:bb", |(_, id)| *id), None);
    }

    #[test]
    fn completion_without_press_does_not_underflow() {
        let mut state = ScreenState::default();
        state.connect_complete(None);
        assert!(!state.is_connecting());
    }
}
