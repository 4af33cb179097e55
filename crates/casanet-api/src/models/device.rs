// Device wire types
//
// Local network devices discovered by the hub's LAN scan, and Bluetooth
// devices seen by its adapter.

use serde::{Deserialize, Serialize};

/// A device found on the hub's local network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNetworkDevice {
    pub mac: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// A Bluetooth peripheral seen by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BluetoothDevice {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Signal strength in dBm.
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub connection_state: Option<String>,
    #[serde(default)]
    pub address_type: Option<String>,
}

/// Request body for renaming a device (`PUT /devices/...`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNameUpdate<'a> {
    pub name: &'a str,
}
