use std::sync::Arc;

use casanet_api::HubClient;
use casanet_api::models::{Minion, MinionStatus, SwitchOptions};
use futures_util::future::BoxFuture;

use super::{not_cached, remote_mutation};
use crate::error::CoreError;
use crate::notifications::Notifier;
use crate::service::{DataService, Fetch};

const RESOURCE: &str = "minions";

struct MinionsFetcher {
    client: HubClient,
}

impl Fetch<Minion> for MinionsFetcher {
    fn fetch_data(&self) -> BoxFuture<'_, Result<Vec<Minion>, CoreError>> {
        Box::pin(async move { Ok(self.client.list_minions().await?) })
    }
}

/// Minions (controllable appliances) registered on the hub.
#[derive(Debug, Clone)]
pub struct MinionsService {
    data: DataService<Minion>,
    client: HubClient,
    notifier: Notifier,
}

impl MinionsService {
    pub fn new(client: HubClient, notifier: Notifier) -> Self {
        let data = DataService::new(
            RESOURCE,
            MinionsFetcher {
                client: client.clone(),
            },
        );
        Self {
            data,
            client,
            notifier,
        }
    }

    pub fn data(&self) -> &DataService<Minion> {
        &self.data
    }

    /// Send a new status to the hub, then store it in the cache.
    pub async fn set_status(
        &self,
        minion_id: &str,
        status: MinionStatus,
    ) -> Result<Arc<Vec<Minion>>, CoreError> {
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "set minion status",
            self.client.set_minion_status(minion_id, &status),
        )
        .await?;

        Ok(self.data.update(|minions| {
            if let Some(minion) = minions.iter_mut().find(|m| m.minion_id == minion_id) {
                minion.minion_status = status;
            }
        }))
    }

    /// Switch a cached minion on or off, keeping its other settings.
    pub async fn set_power(&self, minion_id: &str, on: bool) -> Result<Arc<Vec<Minion>>, CoreError> {
        let cached = self.data.cached().unwrap_or_default();
        let minion = cached
            .iter()
            .find(|m| m.minion_id == minion_id)
            .ok_or_else(|| not_cached("minion", minion_id))?;

        let mut status = minion.minion_status.clone();
        let state = if on { SwitchOptions::On } else { SwitchOptions::Off };
        status.set_switch_state(minion.minion_type, state);
        self.set_status(minion_id, status).await
    }
}
