use std::sync::Arc;

use casanet_api::HubClient;
use casanet_api::models::BluetoothDevice;
use futures_util::future::BoxFuture;
use tracing::info;

use super::remote_mutation;
use crate::error::CoreError;
use crate::notifications::Notifier;
use crate::service::{DataService, Fetch, FetchOutcome};

const RESOURCE: &str = "bluetooth";

struct BluetoothFetcher {
    client: HubClient,
}

impl Fetch<BluetoothDevice> for BluetoothFetcher {
    fn fetch_data(&self) -> BoxFuture<'_, Result<Vec<BluetoothDevice>, CoreError>> {
        Box::pin(async move { Ok(self.client.list_bluetooth_devices().await?) })
    }
}

/// Bluetooth devices seen by the hub.
#[derive(Debug, Clone)]
pub struct BluetoothService {
    data: DataService<BluetoothDevice>,
    client: HubClient,
    notifier: Notifier,
}

impl BluetoothService {
    pub fn new(client: HubClient, notifier: Notifier) -> Self {
        let data = DataService::new(
            RESOURCE,
            BluetoothFetcher {
                client: client.clone(),
            },
        );
        Self {
            data,
            client,
            notifier,
        }
    }

    pub fn data(&self) -> &DataService<BluetoothDevice> {
        &self.data
    }

    /// Rename a device on the hub, then in the cache.
    pub async fn rename(&self, uuid: &str, name: &str) -> Result<Arc<Vec<BluetoothDevice>>, CoreError> {
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "rename bluetooth device",
            self.client.set_bluetooth_device_name(uuid, name),
        )
        .await?;

        Ok(self.data.update(|devices| {
            if let Some(device) = devices.iter_mut().find(|d| d.uuid == uuid) {
                device.name = Some(name.to_owned());
            }
        }))
    }

    /// Ask the hub for a new scan, then refetch the collection.
    pub async fn rescan(&self) -> Result<FetchOutcome<BluetoothDevice>, CoreError> {
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "rescan bluetooth devices",
            self.client.rescan_bluetooth_devices(),
        )
        .await?;
        info!("bluetooth rescan finished, refreshing");
        self.data.refresh().await
    }
}
