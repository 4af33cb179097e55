use std::sync::Arc;

use casanet_api::HubClient;
use casanet_api::models::LocalNetworkDevice;
use futures_util::future::BoxFuture;

use super::remote_mutation;
use crate::error::CoreError;
use crate::notifications::Notifier;
use crate::service::{DataService, Fetch};

const RESOURCE: &str = "devices";

struct DevicesFetcher {
    client: HubClient,
}

impl Fetch<LocalNetworkDevice> for DevicesFetcher {
    fn fetch_data(&self) -> BoxFuture<'_, Result<Vec<LocalNetworkDevice>, CoreError>> {
        Box::pin(async move { Ok(self.client.list_devices().await?) })
    }
}

/// Devices on the hub's local network.
#[derive(Debug, Clone)]
pub struct DevicesService {
    data: DataService<LocalNetworkDevice>,
    client: HubClient,
    notifier: Notifier,
}

impl DevicesService {
    pub fn new(client: HubClient, notifier: Notifier) -> Self {
        let data = DataService::new(
            RESOURCE,
            DevicesFetcher {
                client: client.clone(),
            },
        );
        Self {
            data,
            client,
            notifier,
        }
    }

    pub fn data(&self) -> &DataService<LocalNetworkDevice> {
        &self.data
    }

    pub async fn rename(&self, mac: &str, name: &str) -> Result<Arc<Vec<LocalNetworkDevice>>, CoreError> {
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "rename network device",
            self.client.set_device_name(mac, name),
        )
        .await?;

        Ok(self.data.update(|devices| {
            if let Some(device) = devices.iter_mut().find(|d| d.mac.eq_ignore_ascii_case(mac)) {
                device.name = Some(name.to_owned());
            }
        }))
    }
}
