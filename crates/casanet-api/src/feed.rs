//! Timings push feed with auto-reconnect.
//!
//! Opens the hub's `text/event-stream` endpoint and broadcasts every
//! decoded [`TimingFeed`] through a [`tokio::sync::broadcast`] channel.
//! Reconnects with exponential backoff + jitter until cancelled.
//!
//! # Example
//!
//! ```rust,ignore
//! use casanet_api::feed::{FeedHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = client.timings_feed_url(Some("token"))?;
//! let handle = FeedHandle::connect(client.feed_http().clone(), url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(feed) = rx.recv().await {
//!     println!("{} fired", feed.timing.timing_name);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::TimingFeed;

const FEED_CHANNEL_CAPACITY: usize = 256;

/// Payload the hub sends once per connection before any real event.
/// It arrives either bare or JSON-encoded (`"init"`).
pub const INIT_MESSAGE: &str = "init";

const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

// ── SseEvent / SseDecoder ────────────────────────────────────────────

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field, `None` for the default `message` type.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// Last event id in effect when this event was dispatched.
    pub id: Option<String>,
}

/// Incremental `text/event-stream` decoder.
///
/// Bytes may arrive split anywhere, including between `\r` and `\n`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    // A line ended on `\r` at the end of a chunk; drop a leading `\n` next.
    skip_lf: bool,
    data: String,
    has_data: bool,
    event: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously seen event id (kept across reconnects).
    pub fn with_last_event_id(id: Option<String>) -> Self {
        Self {
            last_event_id: id,
            ..Self::default()
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay requested by the server via `retry:`.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Feed a chunk of bytes, returning every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();

        loop {
            if self.skip_lf && !self.buf.is_empty() {
                if self.buf.first() == Some(&b'\n') {
                    self.buf.advance(1);
                }
                self.skip_lf = false;
            }

            let Some(pos) = self.buf.iter().position(|b| *b == b'\n' || *b == b'\r') else {
                break;
            };

            let line = self.buf.split_to(pos);
            let terminator = self.buf.first().copied();
            self.buf.advance(1);
            if terminator == Some(b'\r') {
                self.skip_lf = true;
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_owned()),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_owned());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event: event.filter(|e| !e.is_empty()),
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
        })
    }
}

// ── Feed message parsing ─────────────────────────────────────────────

/// A decoded message from the timings feed.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    /// Connection handshake, carries nothing.
    Init,
    /// A timing fired.
    Timing(TimingFeed),
}

/// Decode the `data` of one timings feed event.
pub fn parse_feed_message(data: &str) -> Result<FeedMessage, Error> {
    if data.trim().trim_matches('"') == INIT_MESSAGE {
        return Ok(FeedMessage::Init);
    }
    serde_json::from_str(data)
        .map(FeedMessage::Timing)
        .map_err(|e| Error::FeedParse {
            message: e.to_string(),
            data: data.to_owned(),
        })
}

/// Log and broadcast one feed event. `init` and malformed messages are dropped.
fn handle_event(event: &SseEvent, feed_tx: &broadcast::Sender<Arc<TimingFeed>>) {
    match parse_feed_message(&event.data) {
        Ok(FeedMessage::Init) => {
            tracing::trace!("Timings feed handshake");
        }
        Ok(FeedMessage::Timing(feed)) => {
            tracing::info!(
                timing_id = %feed.timing.timing_id,
                timing_name = %feed.timing.timing_name,
                minion_id = %feed.timing.minion_id,
                results = %feed.results,
                "Timing triggered"
            );
            // No subscribers is fine
            let _ = feed_tx.send(Arc::new(feed));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed timings feed message");
        }
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failures before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── FeedHandle ───────────────────────────────────────────────────────

/// Handle to a running timings feed.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](Self::shutdown) or cancel the token passed to `connect`.
#[derive(Debug)]
pub struct FeedHandle {
    feed_tx: broadcast::Sender<Arc<TimingFeed>>,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// Spawn the feed loop with its own broadcast channel.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// spawned task. Must be called from within a tokio runtime.
    pub fn connect(
        http: reqwest::Client,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (feed_tx, _) = broadcast::channel(FEED_CHANNEL_CAPACITY);
        Self::connect_with_sender(http, url, reconnect, cancel, feed_tx)
    }

    /// Spawn the feed loop, publishing into an existing channel.
    ///
    /// Lets a long-lived owner keep one channel while connections come
    /// and go underneath it.
    pub fn connect_with_sender(
        http: reqwest::Client,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        feed_tx: broadcast::Sender<Arc<TimingFeed>>,
    ) -> Self {
        let task_tx = feed_tx.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            feed_loop(http, url, task_tx, reconnect, task_cancel).await;
        });

        Self { feed_tx, cancel }
    }

    /// Get a new receiver for feed notifications.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TimingFeed>> {
        self.feed_tx.subscribe()
    }

    /// Signal the background task to close the connection and exit.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// State carried across reconnects.
#[derive(Debug, Default)]
struct FeedState {
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

/// Main loop: connect → read → on error, backoff → reconnect.
async fn feed_loop(
    http: reqwest::Client,
    url: Url,
    feed_tx: broadcast::Sender<Arc<TimingFeed>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut state = FeedState::default();

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&http, &url, &feed_tx, &cancel, &mut state) => result,
        };

        let delay = match result {
            // Server closed the stream. Wait the advertised retry delay,
            // as an EventSource would, and start counting afresh.
            Ok(()) => {
                if cancel.is_cancelled() {
                    break;
                }
                tracing::info!("Timings feed ended, reconnecting");
                attempt = 0;
                state.retry.unwrap_or(reconnect.initial_delay)
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "Timings feed error");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            "Timings feed reconnection limit reached, giving up"
                        );
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, &reconnect);
                attempt = attempt.saturating_add(1);
                delay
            }
        };

        tracing::debug!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before feed reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("Timings feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one event-stream connection and read it until it drops.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    feed_tx: &broadcast::Sender<Arc<TimingFeed>>,
    cancel: &CancellationToken,
    state: &mut FeedState,
) -> Result<(), Error> {
    tracing::info!(url = %redacted(url), "Connecting to timings feed");

    let mut request = http
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");
    if let Some(ref id) = state.last_event_id {
        request = request.header(LAST_EVENT_ID_HEADER, id.as_str());
    }

    let resp = request
        .send()
        .await
        .map_err(|e| Error::FeedConnect(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::FeedConnect(format!("HTTP {status}")));
    }
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("text/event-stream") {
        return Err(Error::FeedConnect(format!(
            "unexpected content type {content_type:?}"
        )));
    }

    tracing::info!("Timings feed connected");

    let mut decoder = SseDecoder::with_last_event_id(state.last_event_id.clone());
    let mut body = std::pin::pin!(resp.bytes_stream());

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        for event in decoder.push(&bytes) {
                            handle_event(&event, feed_tx);
                        }
                        state.last_event_id = decoder.last_event_id().map(str::to_owned);
                        if decoder.retry().is_some() {
                            state.retry = decoder.retry();
                        }
                    }
                    Some(Err(e)) => return Err(Error::FeedConnect(e.to_string())),
                    None => return Ok(()),
                }
            }
        }
    }
}

/// The feed URL carries the token in its query; keep it out of logs.
fn redacted(url: &Url) -> Url {
    let mut shown = url.clone();
    shown.set_query(None);
    shown
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
pub fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn data_of(events: &[SseEvent]) -> Vec<&str> {
        events.iter().map(|e| e.data.as_str()).collect()
    }

    #[test]
    fn decodes_lf_crlf_and_cr_line_endings() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: a\n\ndata: b\r\n\r\ndata: c\r\r");
        assert_eq!(data_of(&events), vec!["a", "b", "c"]);
    }

    #[test]
    fn crlf_split_across_chunks_is_one_line_break() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: x\r").is_empty());
        assert!(decoder.push(b"\n").is_empty());
        let events = decoder.push(b"\r\n");
        assert_eq!(data_of(&events), vec!["x"]);
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: first\ndata:second\ndata\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "first\nsecond\n");
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\n\nfoo: bar\ndata: y\n\n");
        assert_eq!(data_of(&events), vec!["y"]);
    }

    #[test]
    fn event_id_and_retry_fields_are_honoured() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: timing\nid: 42\nretry: 2500\ndata: z\n\ndata: w\n\n");
        assert_eq!(events[0].event.as_deref(), Some("timing"));
        assert_eq!(events[0].id.as_deref(), Some("42"));
        // Event type resets per dispatch, id persists
        assert_eq!(events[1].event, None);
        assert_eq!(events[1].id.as_deref(), Some("42"));
        assert_eq!(decoder.retry(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn invalid_retry_is_ignored() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"retry: soon\n\n");
        assert_eq!(decoder.retry(), None);
    }

    #[test]
    fn blank_line_without_data_dispatches_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ping\n\n").is_empty());
        let events = decoder.push(b"data: after\n\n");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn incomplete_event_waits_for_terminator() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: par").is_empty());
        assert!(decoder.push(b"tial\n").is_empty());
        assert_eq!(data_of(&decoder.push(b"\n")), vec!["partial"]);
    }

    #[test]
    fn init_message_is_recognised() {
        assert!(matches!(parse_feed_message("init").unwrap(), FeedMessage::Init));
        assert!(matches!(parse_feed_message("\"init\"").unwrap(), FeedMessage::Init));
    }

    #[test]
    fn init_is_not_broadcast() {
        let (tx, mut rx) = broadcast::channel(4);
        let event = SseEvent {
            event: None,
            data: "init".into(),
            id: None,
        };
        handle_event(&event, &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn timing_message_is_broadcast() {
        let (tx, mut rx) = broadcast::channel(4);
        let data = serde_json::json!({
            "timing": {
                "timingId": "t1",
                "timingName": "Morning",
                "minionId": "m1",
                "isActive": true,
                "timingType": "dailyTimeTrigger",
                "timingProperties": { "dailyTimeTrigger": { "hour": 7, "minutes": 30, "days": ["monday"] } }
            },
            "results": { "ok": true }
        });
        let event = SseEvent {
            event: None,
            data: data.to_string(),
            id: None,
        };
        handle_event(&event, &tx);
        let feed = rx.try_recv().unwrap();
        assert_eq!(feed.timing.timing_id, "t1");
        assert_eq!(feed.results["ok"], true);
    }

    #[test]
    fn malformed_message_is_skipped() {
        let (tx, mut rx) = broadcast::channel::<Arc<TimingFeed>>(4);
        let event = SseEvent {
            event: None,
            data: "{not json".into(),
            id: None,
        };
        handle_event(&event, &tx);
        assert!(rx.try_recv().is_err());
        assert!(matches!(
            parse_feed_message("{not json"),
            Err(Error::FeedParse { .. })
        ));
    }

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_grows_then_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };
        let d0 = calculate_backoff(0, &config);
        let d2 = calculate_backoff(2, &config);
        assert!(d2 > d0, "d2 ({d2:?}) should exceed d0 ({d0:?})");
        assert!(calculate_backoff(40, &config) <= Duration::from_millis(12_500));
    }

    #[test]
    fn redacted_url_drops_token() {
        let url = Url::parse("https://hub.local/API/feed/timings?api-key=secret").unwrap();
        assert_eq!(redacted(&url).as_str(), "https://hub.local/API/feed/timings");
    }
}
