use iced::{Event, window};

use crate::config::types::{Config, ValueEncoding};
use crate::device::types::{ConnectedDevice, DeviceEvent};
use crate::os::permissions::PermissionReport;

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    PermissionsChecked(PermissionReport),
    ConfigLoadComplete((Config, Option<String>)),
    ApplyDirtyConfig,
    ConfigSaveComplete(Option<String>), // error message if the save failed
    NoticeConfirmed,
    DeviceEvent(DeviceEvent),
    ScanAndConnect,
    // the device together with the config the scan-and-connect was started with
    ConnectComplete(Option<(ConnectedDevice, Config)>),
    ReadComplete(Option<String>),
    DisconnectComplete(()),
    TeardownComplete(window::Id),
    DeviceNameChange(String),
    EncodingChange(ValueEncoding),
}
