use std::sync::{Arc, Mutex, PoisonError};

use casanet_api::feed::{FeedHandle, ReconnectConfig};
use casanet_api::models::{Timing, TimingFeed};
use casanet_api::HubClient;
use futures_util::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{not_cached, remote_mutation};
use crate::error::CoreError;
use crate::model::validate_timing;
use crate::notifications::Notifier;
use crate::service::{DataService, Fetch};

const RESOURCE: &str = "timings";
const FEED_CHANNEL_SIZE: usize = 256;

// ── Push feed slot ───────────────────────────────────────────────────

/// The single live feed connection of the timings service.
struct TimingsFeed {
    client: HubClient,
    // Same token the REST client sends.
    token: Option<SecretString>,
    reconnect: ReconnectConfig,
    enabled: bool,
    tx: broadcast::Sender<Arc<TimingFeed>>,
    current: Mutex<Option<FeedHandle>>,
    // Parent of every connection token; cancelled on shutdown.
    shutdown: CancellationToken,
}

impl TimingsFeed {
    /// Close the previous connection and open a new one.
    ///
    /// Failures are logged and swallowed: the feed is informational and
    /// must never fail a fetch.
    fn restart(&self) {
        if !self.enabled || self.shutdown.is_cancelled() {
            return;
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            debug!("closing previous timings feed");
            previous.shutdown();
        }

        let url = match self
            .client
            .timings_feed_url(self.token.as_ref().map(|t| t.expose_secret()))
        {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build timings feed URL, feed disabled for this cycle");
                return;
            }
        };

        *current = Some(FeedHandle::connect_with_sender(
            self.client.feed_http().clone(),
            url,
            self.reconnect.clone(),
            self.shutdown.child_token(),
            self.tx.clone(),
        ));
    }

    fn close(&self) {
        if let Some(handle) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.shutdown();
        }
    }

    fn is_open(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_closed())
    }
}

struct TimingsFetcher {
    client: HubClient,
    feed: Arc<TimingsFeed>,
}

impl Fetch<Timing> for TimingsFetcher {
    fn fetch_data(&self) -> BoxFuture<'_, Result<Vec<Timing>, CoreError>> {
        Box::pin(async move {
            self.feed.restart();
            Ok(self.client.list_timings().await?)
        })
    }
}

// ── TimingsService ───────────────────────────────────────────────────

/// Options for the timings push feed.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub enabled: bool,
    pub reconnect: ReconnectConfig,
    /// Sent as the feed's `api-key` query parameter.
    pub token: Option<SecretString>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect: ReconnectConfig::default(),
            token: None,
        }
    }
}

/// Scheduled minion actions, plus the live feed of timings firing.
///
/// Every fetch cycle reopens the feed. Feed messages are broadcast on
/// [`feed`](Self::feed) and never touch the cached collection.
#[derive(Clone)]
pub struct TimingsService {
    data: DataService<Timing>,
    client: HubClient,
    notifier: Notifier,
    feed: Arc<TimingsFeed>,
}

impl std::fmt::Debug for TimingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingsService")
            .field("data", &self.data)
            .field("feed_open", &self.feed.is_open())
            .finish_non_exhaustive()
    }
}

impl TimingsService {
    pub fn new(
        client: HubClient,
        notifier: Notifier,
        options: FeedOptions,
        shutdown: CancellationToken,
    ) -> Self {
        let (tx, _) = broadcast::channel(FEED_CHANNEL_SIZE);
        let feed = Arc::new(TimingsFeed {
            client: client.clone(),
            token: options.token,
            reconnect: options.reconnect,
            enabled: options.enabled,
            tx,
            current: Mutex::new(None),
            shutdown,
        });
        let data = DataService::new(
            RESOURCE,
            TimingsFetcher {
                client: client.clone(),
                feed: Arc::clone(&feed),
            },
        );
        Self {
            data,
            client,
            notifier,
            feed,
        }
    }

    pub fn data(&self) -> &DataService<Timing> {
        &self.data
    }

    /// Receiver for feed notifications across every reconnect.
    pub fn feed(&self) -> broadcast::Receiver<Arc<TimingFeed>> {
        self.feed.tx.subscribe()
    }

    pub fn is_feed_open(&self) -> bool {
        self.feed.is_open()
    }

    /// Close the live feed connection. The next fetch reopens it.
    pub fn close_feed(&self) {
        self.feed.close();
    }

    // ── Local cache edits ────────────────────────────────────────────

    /// Append a timing to the cache and publish.
    pub fn create_timing(&self, timing: Timing) -> Arc<Vec<Timing>> {
        self.data.update(|timings| timings.push(timing))
    }

    /// Replace the cached timing with the same id and publish.
    pub fn update_timing(&self, timing: Timing) -> Arc<Vec<Timing>> {
        self.data.update(|timings| {
            if let Some(slot) = timings.iter_mut().find(|t| t.timing_id == timing.timing_id) {
                *slot = timing;
            }
        })
    }

    /// Remove the cached timing with `timing_id` and publish.
    pub fn delete_timing(&self, timing_id: &str) -> Arc<Vec<Timing>> {
        self.data
            .update(|timings| timings.retain(|t| t.timing_id != timing_id))
    }

    // ── Remote operations ────────────────────────────────────────────

    /// Create on the hub, then append locally.
    pub async fn create(&self, timing: Timing) -> Result<Arc<Vec<Timing>>, CoreError> {
        validate_timing(&timing)?;
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "create timing",
            self.client.create_timing(&timing),
        )
        .await?;
        Ok(self.create_timing(timing))
    }

    /// Replace on the hub, then locally.
    pub async fn update(&self, timing: Timing) -> Result<Arc<Vec<Timing>>, CoreError> {
        validate_timing(&timing)?;
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "update timing",
            self.client.update_timing(&timing),
        )
        .await?;
        Ok(self.update_timing(timing))
    }

    /// Delete on the hub, then locally.
    pub async fn delete(&self, timing_id: &str) -> Result<Arc<Vec<Timing>>, CoreError> {
        remote_mutation(
            &self.notifier,
            RESOURCE,
            "delete timing",
            self.client.delete_timing(timing_id),
        )
        .await?;
        Ok(self.delete_timing(timing_id))
    }

    /// Enable or disable a cached timing.
    pub async fn set_active(
        &self,
        timing_id: &str,
        active: bool,
    ) -> Result<Arc<Vec<Timing>>, CoreError> {
        let cached = self.data.cached().unwrap_or_default();
        let mut timing = cached
            .iter()
            .find(|t| t.timing_id == timing_id)
            .cloned()
            .ok_or_else(|| not_cached("timing", timing_id))?;
        timing.is_active = active;
        self.update(timing).await
    }
}

/// Fresh id for a timing created on this client.
pub fn new_timing_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
