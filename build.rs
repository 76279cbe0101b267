use std::{env, fs};
use std::path::PathBuf;

fn out_dir() -> String {
    env::var("OUT_DIR").expect("No OUT_DIR env var")
}

fn package_version() -> String {
    env::var("CARGO_PKG_VERSION").expect("No CARGO_PKG_VERSION env var")
}

// macOS refuses Bluetooth access to binaries that do not declare why they need it.
fn build_info_plist() {
    let version = package_version();
    let out_path: PathBuf = [out_dir().as_str(), "Info.plist"].iter().collect();

    let plist = format!(r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleDisplayName</key>
    <string>BLE Explorer</string>
    <key>CFBundleExecutable</key>
    <string>BleExplorer</string>
    <key>CFBundleIdentifier</key>
    <string>dev.ble-explorer.BleExplorer</string>
    <key>CFBundleName</key>
    <string>BleExplorer</string>
    <key>CFBundlePackageType</key>
    <string>APPL</string>
    <key>CFBundleShortVersionString</key>
    <string>{version}</string>
    <key>CFBundleVersion</key>
    <string>{version}</string>
    <key>NSBluetoothAlwaysUsageDescription</key>
    <string>BLE Explorer scans for nearby Bluetooth devices and reads values from them.</string>
</dict>
</plist>
"#);

    println!("DEBUG: writing Info.plist to {}", out_path.to_string_lossy());
    fs::write(&out_path, plist).expect("Failed to write Info.plist");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    build_info_plist();
}
