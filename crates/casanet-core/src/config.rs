// ── Runtime hub configuration ──
//
// Describes how to reach a casanet hub. Carries credential data and
// connection tuning, but never touches disk. The CLI builds a `HubConfig`
// (from casanet-config profiles) and hands it to `Hub::new`.

use std::path::PathBuf;
use std::time::Duration;

use casanet_api::transport::{TlsMode, TransportConfig};
use casanet_api::ReconnectConfig;
use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed hubs on the LAN).
    DangerAcceptInvalid,
}

/// Configuration for one hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub URL (e.g., `https://casanet.local`).
    pub url: Url,
    /// Session token. Ignored when `allow_token` is false.
    pub token: Option<SecretString>,
    /// Whether header/query tokens are used at all. Cookie-only hubs
    /// set this to false.
    pub allow_token: bool,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Open the timings push feed on each timings fetch.
    pub feed_enabled: bool,
    pub reconnect: ReconnectConfig,
    /// Where the session (token + profile) is persisted. `None` keeps it
    /// in memory only.
    pub session_path: Option<PathBuf>,
}

impl HubConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            allow_token: true,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            feed_enabled: true,
            reconnect: ReconnectConfig::default(),
            session_path: None,
        }
    }

    /// Transport settings for the api crate.
    pub(crate) fn transport(&self, token: Option<SecretString>) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: self.timeout,
            ..TransportConfig::default()
        }
        .with_cookie_jar();
        match token {
            Some(token) if self.allow_token => transport.with_token(token),
            _ => transport,
        }
    }
}
