// ── Hub registry ──
//
// The process-wide context for one casanet hub: HTTP client, session,
// notification channel and one data service per resource. Built once and
// passed to consumers by reference or clone.

use std::sync::Arc;

use casanet_api::models::User;
use casanet_api::HubClient;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::error::CoreError;
use crate::notifications::{Notification, Notifier};
use crate::resources::{
    BluetoothService, DevicesService, FeedOptions, MinionsService, TimingsService,
};
use crate::session::{FileSessionStore, SessionManager};

/// Cheaply cloneable via `Arc<HubInner>`.
#[derive(Debug, Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

#[derive(Debug)]
struct HubInner {
    config: HubConfig,
    client: HubClient,
    session: SessionManager,
    notifier: Notifier,
    timings: TimingsService,
    bluetooth: BluetoothService,
    devices: DevicesService,
    minions: MinionsService,
    cancel: CancellationToken,
}

impl Hub {
    /// Build the registry. The session is read from `config.session_path`
    /// when set, otherwise kept in memory.
    ///
    /// Does no I/O against the hub; services fetch on first subscribe.
    pub fn new(config: HubConfig) -> Result<Self, CoreError> {
        let session = match config.session_path {
            Some(ref path) => SessionManager::new(
                Arc::new(FileSessionStore::open(path.clone())),
                config.allow_token,
            ),
            None => SessionManager::in_memory(config.allow_token),
        };
        Self::with_session(config, session)
    }

    pub fn with_session(config: HubConfig, session: SessionManager) -> Result<Self, CoreError> {
        // An explicit token wins over the stored one. REST and the feed
        // both authenticate with the result.
        let token = config
            .token
            .clone()
            .filter(|_| config.allow_token)
            .or_else(|| session.token());
        if let (Some(token), None) = (&config.token, session.token()) {
            session.set_token(token)?;
        }

        let client = HubClient::new(config.url.clone(), &config.transport(token.clone()))?;
        let notifier = Notifier::new();
        let cancel = CancellationToken::new();

        let timings = TimingsService::new(
            client.clone(),
            notifier.clone(),
            FeedOptions {
                enabled: config.feed_enabled,
                reconnect: config.reconnect.clone(),
                token,
            },
            cancel.clone(),
        );
        let bluetooth = BluetoothService::new(client.clone(), notifier.clone());
        let devices = DevicesService::new(client.clone(), notifier.clone());
        let minions = MinionsService::new(client.clone(), notifier.clone());

        debug!(url = %config.url, feed = config.feed_enabled, "hub registry created");

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                client,
                session,
                notifier,
                timings,
                bluetooth,
                devices,
                minions,
                cancel,
            }),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &HubClient {
        &self.inner.client
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn notifications(&self) -> tokio::sync::broadcast::Receiver<Arc<Notification>> {
        self.inner.notifier.subscribe()
    }

    pub fn timings(&self) -> &TimingsService {
        &self.inner.timings
    }

    pub fn bluetooth(&self) -> &BluetoothService {
        &self.inner.bluetooth
    }

    pub fn devices(&self) -> &DevicesService {
        &self.inner.devices
    }

    pub fn minions(&self) -> &MinionsService {
        &self.inner.minions
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Log in and remember the profile (and token, when one is issued).
    ///
    /// This client keeps using the session cookie; a new token header
    /// takes effect for hubs built after the login.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        let response = self.inner.client.login(email, password).await?;
        self.inner.session.on_login(&response.profile)?;
        if let Some(ref token) = response.token {
            self.inner.session.set_token(token)?;
        }
        info!(email, "logged in");
        Ok(response.profile)
    }

    /// End the session on the hub and forget it locally.
    ///
    /// The local session is cleared even when the hub call fails.
    pub async fn logout(&self) -> Result<(), CoreError> {
        let remote = self.inner.client.logout().await;
        self.inner.session.on_logout()?;
        if let Err(e) = remote {
            warn!(error = %e, "hub logout failed, local session cleared anyway");
            return Err(e.into());
        }
        info!("logged out");
        Ok(())
    }

    /// Close the timings feed and stop every background task.
    pub fn shutdown(&self) {
        self.inner.timings.close_feed();
        self.inner.cancel.cancel();
        debug!("hub shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}
