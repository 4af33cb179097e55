// Device endpoints
//
// Local network devices (`/API/devices`) and Bluetooth devices
// (`/API/devices/bluetooth`). Renames are keyed by MAC / UUID.

use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;
use crate::models::{BluetoothDevice, DeviceNameUpdate, LocalNetworkDevice};

impl HubClient {
    /// List devices found on the local network.
    ///
    /// `GET /API/devices`
    pub async fn list_devices(&self) -> Result<Vec<LocalNetworkDevice>, Error> {
        let url = self.api_url("devices")?;
        debug!("listing network devices");
        self.get(url).await
    }

    /// Rename a network device.
    ///
    /// `PUT /API/devices/{mac}`
    pub async fn set_device_name(&self, mac: &str, name: &str) -> Result<(), Error> {
        let url = self.item_url("devices", mac)?;
        debug!(mac, name, "renaming network device");
        self.put(url, &DeviceNameUpdate { name }).await
    }

    /// List Bluetooth devices seen by the hub.
    ///
    /// `GET /API/devices/bluetooth`
    pub async fn list_bluetooth_devices(&self) -> Result<Vec<BluetoothDevice>, Error> {
        let url = self.api_url("devices/bluetooth")?;
        debug!("listing bluetooth devices");
        self.get(url).await
    }

    /// Rename a Bluetooth device.
    ///
    /// `PUT /API/devices/bluetooth/{uuid}`
    pub async fn set_bluetooth_device_name(&self, uuid: &str, name: &str) -> Result<(), Error> {
        let url = self.item_url("devices/bluetooth", uuid)?;
        debug!(uuid, name, "renaming bluetooth device");
        self.put(url, &DeviceNameUpdate { name }).await
    }

    /// Ask the hub to run a fresh Bluetooth scan. Resolves when the scan ends.
    ///
    /// `POST /API/devices/bluetooth/rescan`
    pub async fn rescan_bluetooth_devices(&self) -> Result<(), Error> {
        let url = self.api_url("devices/bluetooth/rescan")?;
        debug!("rescanning bluetooth devices");
        self.post_empty(url).await
    }
}
