// Minion endpoints

use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;
use crate::models::{Minion, MinionStatus};

impl HubClient {
    /// List every minion.
    ///
    /// `GET /API/minions`
    pub async fn list_minions(&self) -> Result<Vec<Minion>, Error> {
        let url = self.api_url("minions")?;
        debug!("listing minions");
        self.get(url).await
    }

    /// Apply a new status to a minion.
    ///
    /// `PUT /API/minions/{minionId}`
    pub async fn set_minion_status(&self, minion_id: &str, status: &MinionStatus) -> Result<(), Error> {
        let url = self.item_url("minions", minion_id)?;
        debug!(minion_id, "setting minion status");
        self.put(url, status).await
    }
}
