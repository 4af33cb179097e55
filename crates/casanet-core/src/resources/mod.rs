// ── Resource services ──
//
// One service per hub resource. Each wraps a `DataService` with the
// fetcher for its collection and the remote mutations the hub offers.
// Mutations are applied locally only after the hub accepted them.

mod bluetooth;
mod devices;
mod minions;
mod timings;

use std::future::Future;

use tracing::warn;

use crate::error::CoreError;
use crate::notifications::Notifier;

pub use bluetooth::BluetoothService;
pub use devices::DevicesService;
pub use minions::MinionsService;
pub use timings::{FeedOptions, TimingsService, new_timing_id};

/// Await a remote mutation. On failure the hub's reason is wrapped in
/// [`CoreError::MutationFailed`] and also sent as an error notification.
pub(crate) async fn remote_mutation<R>(
    notifier: &Notifier,
    resource: &'static str,
    action: &str,
    remote: impl Future<Output = Result<R, casanet_api::Error>>,
) -> Result<R, CoreError> {
    match remote.await {
        Ok(value) => Ok(value),
        Err(e) => {
            let cause = CoreError::from(e);
            warn!(resource, action, error = %cause, "remote mutation failed");
            let err = CoreError::mutation(action, &cause);
            notifier.error(resource, err.to_string());
            Err(err)
        }
    }
}

/// Error for an id that is not in the cached collection.
pub(crate) fn not_cached(entity_type: &str, identifier: &str) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.to_owned(),
        identifier: identifier.to_owned(),
    }
}
