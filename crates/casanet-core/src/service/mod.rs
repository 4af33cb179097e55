// ── Observable fetch-cache ──
//
// `DataService<T>` holds the last successfully fetched collection for one
// hub resource and republishes it to every registered observer. Fetching
// is delegated to a `Fetch<T>` capability so resource services compose a
// fetcher instead of inheriting behaviour.

mod fetch;

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::CoreError;

pub use fetch::{Fetch, FetchFn};

type Observer<T> = Arc<dyn Fn(&Arc<Vec<T>>) + Send + Sync>;

// ── Public types ─────────────────────────────────────────────────────

/// Handle returned by [`DataService::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Result of one fetch cycle.
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    /// The fetched collection was cached and published.
    Applied(Arc<Vec<T>>),
    /// A newer cycle was issued meanwhile; this result was dropped.
    Superseded,
}

impl<T> FetchOutcome<T> {
    pub fn applied(self) -> Option<Arc<Vec<T>>> {
        match self {
            Self::Applied(data) => Some(data),
            Self::Superseded => None,
        }
    }
}

/// Observable fetch state of a service.
#[derive(Debug, Clone, Default)]
pub struct ServiceStatus {
    /// At least one fetch cycle is in flight.
    pub loading: bool,
    /// Failure of the most recent cycle, cleared by the next success.
    pub error: Option<Arc<CoreError>>,
    /// When the cache was last replaced by a fetch.
    pub last_updated: Option<DateTime<Utc>>,
}

// ── DataService ──────────────────────────────────────────────────────

/// Cached, observable collection for one hub resource.
///
/// Cheaply cloneable; clones share the cache and subscriber list.
pub struct DataService<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DataService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for DataService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataService")
            .field("resource", &self.inner.resource)
            .field("cached", &self.inner.cache.load_full().map(|c| c.len()))
            .field("in_flight", &self.inner.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

struct Inner<T> {
    resource: &'static str,
    fetcher: Box<dyn Fetch<T>>,
    cache: ArcSwapOption<Vec<T>>,
    state: Mutex<State<T>>,
    // Last issued fetch ticket.
    ticket: AtomicU64,
    in_flight: AtomicUsize,
    status: watch::Sender<ServiceStatus>,
}

struct State<T> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer<T>)>,
    queue: VecDeque<Delivery<T>>,
    dispatching: bool,
}

/// One queued publish: the payload and who should receive it.
struct Delivery<T> {
    payload: Arc<Vec<T>>,
    targets: Vec<SubscriptionId>,
}

impl<T: Send + Sync + 'static> DataService<T> {
    pub fn new(resource: &'static str, fetcher: impl Fetch<T>) -> Self {
        let (status, _) = watch::channel(ServiceStatus::default());
        Self {
            inner: Arc::new(Inner {
                resource,
                fetcher: Box::new(fetcher),
                cache: ArcSwapOption::empty(),
                state: Mutex::new(State {
                    next_id: 1,
                    observers: Vec::new(),
                    queue: VecDeque::new(),
                    dispatching: false,
                }),
                ticket: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                status,
            }),
        }
    }

    /// Resource name used in logs and errors.
    pub fn resource(&self) -> &'static str {
        self.inner.resource
    }

    /// The cached collection, `None` until the first publish.
    pub fn cached(&self) -> Option<Arc<Vec<T>>> {
        self.inner.cache.load_full()
    }

    pub fn status(&self) -> watch::Receiver<ServiceStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    // ── Subscription ─────────────────────────────────────────────────

    /// Register an observer.
    ///
    /// The observer is called at once with the cached collection when one
    /// exists, then with every later publish. With an empty cache and no
    /// fetch in flight, a single initial fetch is spawned on the current
    /// tokio runtime; observers subscribing while it runs wait for it.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Arc<Vec<T>>) + Send + Sync + 'static,
    {
        let (id, has_cache) = {
            let mut state = self.inner.lock();
            let id = SubscriptionId(state.next_id);
            state.next_id += 1;
            state.observers.push((id, Arc::new(observer)));

            let cached = self.inner.cache.load_full();
            let has_cache = cached.is_some();
            if let Some(payload) = cached {
                state.queue.push_back(Delivery {
                    payload,
                    targets: vec![id],
                });
            }
            (id, has_cache)
        };
        trace!(resource = self.inner.resource, %id, "subscribed");

        if has_cache {
            self.inner.drain();
        } else {
            self.spawn_initial_fetch();
        }
        id
    }

    /// Remove an observer. Unknown or already removed ids are ignored.
    ///
    /// Returns whether the observer was still registered. Never cancels an
    /// in-flight fetch.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.inner.lock();
        let before = state.observers.len();
        state.observers.retain(|(oid, _)| *oid != id);
        let removed = state.observers.len() != before;
        drop(state);
        if removed {
            trace!(resource = self.inner.resource, %id, "unsubscribed");
        }
        removed
    }

    // ── Publishing ───────────────────────────────────────────────────

    /// Replace the cache and notify every current observer, in
    /// registration order.
    ///
    /// Publishing from inside an observer queues the new payload; it is
    /// delivered after the current round finishes.
    pub fn post_new_data(&self, data: Vec<T>) -> Arc<Vec<T>> {
        let payload = Arc::new(data);
        {
            let mut state = self.inner.lock();
            self.inner.enqueue(&mut state, Arc::clone(&payload));
        }
        debug!(resource = self.inner.resource, count = payload.len(), "publishing collection");
        self.inner.drain();
        payload
    }

    /// Publish a locally edited copy of the cache.
    ///
    /// `edit` receives a clone of the cached collection (empty when
    /// nothing is cached yet).
    pub fn update<F>(&self, edit: F) -> Arc<Vec<T>>
    where
        T: Clone,
        F: FnOnce(&mut Vec<T>),
    {
        let mut data = self
            .inner
            .cache
            .load_full()
            .map(|c| c.as_ref().clone())
            .unwrap_or_default();
        edit(&mut data);
        self.post_new_data(data)
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Run a fetch cycle now, even when data is cached.
    ///
    /// A result that resolves after a newer cycle was issued is discarded
    /// and reported as [`FetchOutcome::Superseded`]. Failures leave the
    /// cache intact, are recorded in [`ServiceStatus::error`] and are not
    /// retried.
    pub async fn refresh(&self) -> Result<FetchOutcome<T>, CoreError> {
        self.inner.begin_fetch();
        let ticket = self.inner.issue_ticket();
        run_cycle(&self.inner, ticket).await
    }

    fn spawn_initial_fetch(&self) {
        if self
            .inner
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!(resource = self.inner.resource, "fetch in flight, waiting for it");
            return;
        }
        self.inner.set_loading(true);
        let ticket = self.inner.issue_ticket();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(resource = self.inner.resource, "no tokio runtime, initial fetch skipped");
            self.inner.end_fetch();
            return;
        };

        let inner = Arc::clone(&self.inner);
        debug!(resource = inner.resource, ticket, "spawning initial fetch");
        runtime.spawn(async move {
            // Errors are already on the status channel.
            let _ = run_cycle(&inner, ticket).await;
        });
    }
}

/// One fetch cycle. The caller has already counted it as in flight.
async fn run_cycle<T: Send + Sync + 'static>(
    inner: &Arc<Inner<T>>,
    ticket: u64,
) -> Result<FetchOutcome<T>, CoreError> {
    let _in_flight = InFlightGuard(inner);
    debug!(resource = inner.resource, ticket, "fetch cycle started");

    let result = inner.fetcher.fetch_data().await;

    match result {
        Ok(data) => match inner.apply_if_latest(ticket, data) {
            Some(payload) => {
                inner.status.send_modify(|s| {
                    s.error = None;
                    s.last_updated = Some(Utc::now());
                });
                debug!(resource = inner.resource, ticket, count = payload.len(), "fetch applied");
                Ok(FetchOutcome::Applied(payload))
            }
            None => {
                debug!(resource = inner.resource, ticket, "discarding superseded fetch result");
                Ok(FetchOutcome::Superseded)
            }
        },
        Err(e) => {
            if inner.ticket.load(Ordering::SeqCst) != ticket {
                debug!(resource = inner.resource, ticket, error = %e, "ignoring superseded fetch failure");
                return Ok(FetchOutcome::Superseded);
            }
            warn!(resource = inner.resource, ticket, error = %e, "fetch failed");
            let shared = Arc::new(e.clone());
            inner.status.send_modify(|s| s.error = Some(shared));
            Err(e)
        }
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_ticket(&self) -> u64 {
        self.ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn begin_fetch(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.set_loading(true);
        }
    }

    fn end_fetch(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.set_loading(false);
        }
    }

    fn set_loading(&self, loading: bool) {
        self.status.send_if_modified(|s| {
            let changed = s.loading != loading;
            s.loading = loading;
            changed
        });
    }

    /// Store `payload` and queue it for every registered observer.
    /// Must run under the state lock so cache order matches queue order.
    fn enqueue(&self, state: &mut State<T>, payload: Arc<Vec<T>>) {
        self.cache.store(Some(Arc::clone(&payload)));
        let targets = state.observers.iter().map(|(id, _)| *id).collect();
        state.queue.push_back(Delivery { payload, targets });
    }

    fn apply_if_latest(&self, ticket: u64, data: Vec<T>) -> Option<Arc<Vec<T>>> {
        let payload = {
            let mut state = self.lock();
            if self.ticket.load(Ordering::SeqCst) != ticket {
                return None;
            }
            let payload = Arc::new(data);
            self.enqueue(&mut state, Arc::clone(&payload));
            payload
        };
        self.drain();
        Some(payload)
    }

    /// Deliver queued payloads until the queue is empty.
    ///
    /// Only one caller dispatches at a time; a nested or concurrent call
    /// returns at once and its payload is picked up by the active loop.
    /// Observers run without the state lock held.
    fn drain(&self) {
        {
            let mut state = self.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        let _guard = DispatchGuard(self);

        loop {
            let delivery = {
                let mut state = self.lock();
                let Some(delivery) = state.queue.pop_front() else {
                    state.dispatching = false;
                    return;
                };
                delivery
            };

            for id in &delivery.targets {
                let observer = self
                    .lock()
                    .observers
                    .iter()
                    .find(|(oid, _)| oid == id)
                    .map(|(_, o)| Arc::clone(o));
                // Unsubscribed since the publish was queued.
                if let Some(observer) = observer {
                    observer(&delivery.payload);
                }
            }
        }
    }
}

/// Releases the dispatch flag if an observer panics mid-round.
struct DispatchGuard<'a, T>(&'a Inner<T>);

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().dispatching = false;
        }
    }
}

/// Marks a fetch cycle finished however it exits.
struct InFlightGuard<'a, T>(&'a Inner<T>);

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        self.0.end_fetch();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn static_service(items: Vec<u32>) -> DataService<u32> {
        DataService::new(
            "numbers",
            FetchFn(move || {
                let items = items.clone();
                async move { Ok::<_, CoreError>(items) }
            }),
        )
    }

    fn recorder() -> (Arc<Mutex<Vec<Vec<u32>>>>, impl Fn(&Arc<Vec<u32>>) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |data: &Arc<Vec<u32>>| {
            sink.lock().unwrap().push(data.as_ref().clone());
        })
    }

    #[test]
    fn post_notifies_in_registration_order() {
        let service = static_service(vec![]);
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            // No runtime: the initial fetch is skipped.
            service.subscribe(move |_| order.lock().unwrap().push(n));
        }
        service.post_new_data(vec![1]);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn subscriber_gets_cached_value_immediately() {
        let service = static_service(vec![]);
        service.post_new_data(vec![7, 8]);
        let (seen, observer) = recorder();
        service.subscribe(observer);
        assert_eq!(*seen.lock().unwrap(), vec![vec![7, 8]]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let service = static_service(vec![]);
        let (seen, observer) = recorder();
        let id = service.subscribe(observer);
        assert!(service.unsubscribe(id));
        assert!(!service.unsubscribe(id));
        service.post_new_data(vec![1]);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(service.subscriber_count(), 0);
    }

    #[test]
    fn reentrant_publish_is_delivered_after_current_round() {
        let service = static_service(vec![]);
        let log = Arc::new(Mutex::new(Vec::new()));

        let svc = service.clone();
        let first_log = Arc::clone(&log);
        service.subscribe(move |data| {
            first_log.lock().unwrap().push(("a", data.as_ref().clone()));
            if data.as_slice() == [1] {
                svc.post_new_data(vec![2]);
            }
        });
        let second_log = Arc::clone(&log);
        service.subscribe(move |data| {
            second_log.lock().unwrap().push(("b", data.as_ref().clone()));
        });

        service.post_new_data(vec![1]);

        assert_eq!(
            *log.lock().unwrap(),
            vec![("a", vec![1]), ("b", vec![1]), ("a", vec![2]), ("b", vec![2])]
        );
        assert_eq!(service.cached().unwrap().as_slice(), [2]);
    }

    #[test]
    fn observer_removed_during_round_is_skipped() {
        let service = static_service(vec![]);
        let (seen, observer) = recorder();
        let victim = Arc::new(Mutex::new(None::<SubscriptionId>));

        let svc = service.clone();
        let target = Arc::clone(&victim);
        service.subscribe(move |_| {
            if let Some(id) = *target.lock().unwrap() {
                svc.unsubscribe(id);
            }
        });
        let id = service.subscribe(observer);
        *victim.lock().unwrap() = Some(id);

        service.post_new_data(vec![5]);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn update_edits_a_copy_of_the_cache() {
        let service = static_service(vec![]);
        let before = service.post_new_data(vec![1, 2]);
        let after = service.update(|v| v.push(3));
        assert_eq!(before.as_slice(), [1, 2]);
        assert_eq!(after.as_slice(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_cache_and_records_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let service: DataService<u32> = DataService::new(
            "flaky",
            FetchFn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(vec![1])
                    } else {
                        Err(CoreError::Internal("down".into()))
                    }
                }
            }),
        );

        service.refresh().await.unwrap();
        assert!(service.refresh().await.is_err());

        assert_eq!(service.cached().unwrap().as_slice(), [1]);
        let status = service.status().borrow().clone();
        assert!(!status.loading);
        assert!(status.error.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn successful_refresh_clears_previous_error() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let flag = Arc::clone(&fail);
        let service: DataService<u32> = DataService::new(
            "recovering",
            FetchFn(move || {
                let failing = flag.load(Ordering::SeqCst);
                async move {
                    if failing {
                        Err(CoreError::Internal("down".into()))
                    } else {
                        Ok(vec![4])
                    }
                }
            }),
        );

        assert!(service.refresh().await.is_err());
        fail.store(false, Ordering::SeqCst);
        let data = service.refresh().await.unwrap().applied().unwrap();
        assert_eq!(data.as_slice(), [4]);
        let status = service.status().borrow().clone();
        assert!(status.error.is_none());
        assert!(status.last_updated.is_some());
    }
}
