// Hub REST client
//
// Wraps `reqwest::Client` with hub-specific URL construction and status
// handling. Resource endpoints (timings, devices, minions, auth) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Path segment every REST endpoint lives under.
const API_PREFIX: &str = "API/";

/// Raw HTTP client for a casanet hub.
///
/// All methods return decoded payloads; non-2xx responses are mapped to
/// [`Error::Authentication`] (401/403) or [`Error::Server`].
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    feed_http: reqwest::Client,
    base_url: Url,
    api_root: Url,
}

impl HubClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// A cookie jar is always attached: the hub also accepts its session
    /// cookie when no token header is sent. `base_url` is the hub root,
    /// e.g. `https://casanet.local`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        let feed_http = config.build_feed_client()?;
        Ok(Self::with_client(http, base_url)?.with_feed_client(feed_http))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The same client is used for the timings feed unless
    /// [`with_feed_client`](Self::with_feed_client) overrides it.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        let api_root = api_root(&base_url)?;
        Ok(Self {
            feed_http: http.clone(),
            http,
            base_url,
            api_root,
        })
    }

    /// Use a dedicated client (no request timeout) for the event stream.
    pub fn with_feed_client(mut self, feed_http: reqwest::Client) -> Self {
        self.feed_http = feed_http;
        self
    }

    /// The hub base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/API/`, the root every endpoint is joined onto.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The client used for long-lived feed connections.
    pub fn feed_http(&self) -> &reqwest::Client {
        &self.feed_http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/API/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.api_root.join(path.trim_start_matches('/'))?)
    }

    /// Build `{base}/API/{collection}/{id}` with `id` percent-encoded as a
    /// single path segment.
    pub(crate) fn item_url(&self, collection: &str, id: &str) -> Result<Url, Error> {
        let mut url = self.api_url(collection)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// `{base}/API/feed/timings?api-key={token}`.
    ///
    /// Browsers cannot set headers on an event stream, so the hub reads the
    /// token from the query string. An absent token yields an empty value.
    pub fn timings_feed_url(&self, token: Option<&str>) -> Result<Url, Error> {
        let mut url = self.api_url("feed/timings")?;
        url.query_pairs_mut()
            .append_pair(crate::transport::API_KEY_HEADER, token.unwrap_or_default());
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        parse_json(resp).await
    }

    /// Send a POST request with JSON body; the response body is ignored.
    pub(crate) async fn post(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }

    /// Send a bodiless POST (actions such as logout or rescan).
    pub(crate) async fn post_empty(&self, url: Url) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }

    /// Send a PUT request with JSON body; the response body is ignored.
    pub(crate) async fn put(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("PUT {}", url);
        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }

    /// Send a DELETE request; the response body is ignored.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }
}

/// Normalise the base URL to end with `/` and append the API prefix.
fn api_root(base_url: &Url) -> Result<Url, Error> {
    let mut root = base_url.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    Ok(root.join(API_PREFIX)?)
}

/// Map non-2xx statuses to errors, passing successful responses through.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body
            },
        });
    }

    Err(Error::Server {
        status: status.as_u16(),
        message: server_message(&body),
    })
}

/// The hub reports failures as `{ "responseCode": n, "message": "..." }`.
/// Fall back to the raw body when that shape is absent.
fn server_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
