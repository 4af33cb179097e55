// Shared transport configuration for building reqwest::Client instances.
//
// The REST client and the timings feed share TLS, timeout, and cookie
// settings through this module. The feed client must not carry the
// request timeout, since the event stream stays open indefinitely.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header (and feed query parameter) name carrying the session token.
pub const API_KEY_HEADER: &str = "api-key";

const USER_AGENT: &str = concat!("casanet-cli/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed hubs on the LAN).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
    pub token: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
            token: None,
        }
    }
}

impl TransportConfig {
    /// Build the REST `reqwest::Client`: request timeout plus the
    /// `api-key` default header when a token is configured.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = self.base_builder()?.timeout(self.timeout);
        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Build the streaming client used by the timings feed.
    ///
    /// Only the connect phase is bounded; the body is read until the
    /// server or the caller closes it.
    pub fn build_feed_client(&self) -> Result<reqwest::Client, Error> {
        let builder = self.base_builder()?.connect_timeout(self.timeout);
        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build feed client: {e}")))
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Attach a session token sent as the `api-key` header.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    fn base_builder(&self) -> Result<reqwest::ClientBuilder, Error> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        if let Some(headers) = self.default_headers()? {
            builder = builder.default_headers(headers);
        }

        Ok(builder)
    }

    fn default_headers(&self) -> Result<Option<HeaderMap>, Error> {
        let Some(ref token) = self.token else {
            return Ok(None);
        };
        let raw = token.expose_secret();
        if raw.is_empty() {
            return Ok(None);
        }

        let mut value = HeaderValue::from_str(raw).map_err(|_| Error::Authentication {
            message: "token contains characters not allowed in a header".into(),
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, value);
        Ok(Some(headers))
    }
}
