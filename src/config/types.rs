use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cli::Cli;
use crate::device::constants::{DEFAULT_CHARACTERISTIC_UUID, DEFAULT_DEVICE_NAME, DEFAULT_SERVICE_UUID};

/// How the raw bytes of the characteristic are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    #[default]
    Utf8,
    Base64,
}

impl ValueEncoding {
    pub const ALL: &'static [ValueEncoding] = &[ValueEncoding::Utf8, ValueEncoding::Base64];
}

impl std::fmt::Display for ValueEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            ValueEncoding::Utf8 => "UTF-8",
            ValueEncoding::Base64 => "Base64",
        };

        write!(f, "{}", result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub device_name: String,
    pub service_uuid: Uuid,
    pub characteristic_uuid: Uuid,
    pub encoding: ValueEncoding,
}

impl Config {
    /// Command line values win over whatever was read from the config file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(device_name) = &cli.device_name {
            self.device_name = device_name.clone();
        }
        if let Some(service_uuid) = cli.service {
            self.service_uuid = service_uuid;
        }
        if let Some(characteristic_uuid) = cli.characteristic {
            self.characteristic_uuid = characteristic_uuid;
        }
        if let Some(encoding) = cli.encoding {
            self.encoding = encoding;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            service_uuid: DEFAULT_SERVICE_UUID,
            characteristic_uuid: DEFAULT_CHARACTERISTIC_UUID,
            encoding: ValueEncoding::Utf8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use uuid::uuid;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"deviceName": "Thermo"}"#).unwrap();

        assert_eq!(config.device_name, "Thermo");
        assert_eq!(config.service_uuid, DEFAULT_SERVICE_UUID);
        assert_eq!(config.characteristic_uuid, DEFAULT_CHARACTERISTIC_UUID);
        assert_eq!(config.encoding, ValueEncoding::Utf8);
    }

    #[test]
    fn json_uses_camel_case_and_lowercase_encoding() {
        let config = Config {
            encoding: ValueEncoding::Base64,
            ..Config::default()
        };
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["deviceName"], "MyBLEDevice");
        assert_eq!(json["serviceUuid"], "12345678-1234-1234-1234-123456789abc");
        assert_eq!(json["characteristicUuid"], "abcdefab-1234-1234-1234-abcdefabcdef");
        assert_eq!(json["encoding"], "base64");
    }

    #[test]
    fn invalid_uuid_is_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"serviceUuid": "not-a-uuid"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn command_line_overrides_win() {
        let mut config = Config {
            device_name: "FromFile".to_string(),
            ..Config::default()
        };
        let cli = Cli::parse_from([
            "ble-explorer",
            "--device-name", "FromCli",
            "--characteristic", "00002a19-0000-1000-8000-00805f9b34fb",
            "--encoding", "base64",
        ]);

        config.apply_overrides(&cli);

        assert_eq!(config.device_name, "FromCli");
        assert_eq!(config.service_uuid, DEFAULT_SERVICE_UUID);
        assert_eq!(config.characteristic_uuid, uuid!("00002a19-0000-1000-8000-00805f9b34fb"));
        assert_eq!(config.encoding, ValueEncoding::Base64);
    }

    #[test]
    fn no_overrides_keeps_config() {
        let mut config = Config::default();
        config.apply_overrides(&Cli::parse_from(["ble-explorer"]));
        assert_eq!(config, Config::default());
    }
}
