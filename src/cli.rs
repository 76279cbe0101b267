use std::path::PathBuf;
use clap::Parser;
use uuid::Uuid;

use crate::config::types::ValueEncoding;

/// Scan for Bluetooth LE devices and read a value from one of them.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Advertised name of the device to connect to
    #[arg(long)]
    pub device_name: Option<String>,

    /// UUID of the GATT service that holds the characteristic
    #[arg(long)]
    pub service: Option<Uuid>,

    /// UUID of the characteristic to read
    #[arg(long)]
    pub characteristic: Option<Uuid>,

    /// How to turn the characteristic value into text
    #[arg(long, value_enum)]
    pub encoding: Option<ValueEncoding>,

    /// Use this config file instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}
