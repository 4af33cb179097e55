// Timing endpoints
//
// CRUD over `/API/timings`. The hub echoes nothing useful on update and
// delete, so those return `()`.

use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;
use crate::models::Timing;

impl HubClient {
    /// List every timing.
    ///
    /// `GET /API/timings`
    pub async fn list_timings(&self) -> Result<Vec<Timing>, Error> {
        let url = self.api_url("timings")?;
        debug!("listing timings");
        self.get(url).await
    }

    /// Create a timing. The id is chosen by the caller.
    ///
    /// `POST /API/timings`
    pub async fn create_timing(&self, timing: &Timing) -> Result<(), Error> {
        let url = self.api_url("timings")?;
        debug!(timing_id = %timing.timing_id, "creating timing");
        self.post(url, timing).await
    }

    /// Replace a timing.
    ///
    /// `PUT /API/timings/{timingId}`
    pub async fn update_timing(&self, timing: &Timing) -> Result<(), Error> {
        let url = self.item_url("timings", &timing.timing_id)?;
        debug!(timing_id = %timing.timing_id, "updating timing");
        self.put(url, timing).await
    }

    /// Delete a timing.
    ///
    /// `DELETE /API/timings/{timingId}`
    pub async fn delete_timing(&self, timing_id: &str) -> Result<(), Error> {
        let url = self.item_url("timings", timing_id)?;
        debug!(timing_id, "deleting timing");
        self.delete(url).await
    }
}
