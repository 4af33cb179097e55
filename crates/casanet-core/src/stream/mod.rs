// ── Consumer-facing subscriptions ──
//
// `UseData` is the render-loop view of a service: current collection plus
// loading flag, with an async `changed()` to wait for the next repaint.
// `CollectionStream` yields every published collection in order.
// Both unsubscribe when dropped.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::{mpsc, watch};

use crate::service::{DataService, ServiceStatus, SubscriptionId};

// ── UseData ──────────────────────────────────────────────────────────

/// Live view of a [`DataService`] for a consumer that re-renders.
///
/// Holds its subscription for as long as it lives; dropping it (on any
/// exit path, including `?` returns and unwinding) unsubscribes.
pub struct UseData<T: Send + Sync + 'static> {
    service: DataService<T>,
    id: SubscriptionId,
    data: watch::Receiver<Arc<Vec<T>>>,
    received: watch::Receiver<bool>,
    status: watch::Receiver<ServiceStatus>,
}

impl<T: Send + Sync + 'static> UseData<T> {
    /// The collection to render and whether a fetch is still pending.
    ///
    /// Until the first publish arrives the collection is the default
    /// passed to [`DataService::use_data`] and loading is `true`, unless
    /// the fetch already failed.
    pub fn current(&self) -> (Arc<Vec<T>>, bool) {
        let data = Arc::clone(&self.data.borrow());
        (data, self.is_loading())
    }

    pub fn is_loading(&self) -> bool {
        let status = self.status.borrow();
        status.loading || (!*self.received.borrow() && status.error.is_none())
    }

    /// Error of the most recent fetch cycle, if it failed.
    pub fn error(&self) -> Option<Arc<crate::CoreError>> {
        self.status.borrow().error.clone()
    }

    /// Wait until the collection or the loading state changes, then return
    /// the new [`current`](Self::current) pair.
    pub async fn changed(&mut self) -> (Arc<Vec<T>>, bool) {
        // Both senders outlive `self`: the data sender sits in our own
        // observer and the status sender in the service.
        tokio::select! {
            _ = self.data.changed() => {}
            _ = self.status.changed() => {}
        }
        self.data.borrow_and_update();
        self.status.borrow_and_update();
        self.current()
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.id
    }
}

impl<T: Send + Sync + 'static> Drop for UseData<T> {
    fn drop(&mut self) {
        self.service.unsubscribe(self.id);
    }
}

// ── CollectionStream ─────────────────────────────────────────────────

/// `Stream` of every collection a service publishes, in publish order.
///
/// Backed by an unbounded channel so no payload is coalesced or dropped.
pub struct CollectionStream<T: Send + Sync + 'static> {
    service: DataService<T>,
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Arc<Vec<T>>>,
}

impl<T: Send + Sync + 'static> Stream for CollectionStream<T> {
    type Item = Arc<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T: Send + Sync + 'static> Drop for CollectionStream<T> {
    fn drop(&mut self) {
        self.service.unsubscribe(self.id);
    }
}

// ── DataService entry points ─────────────────────────────────────────

impl<T: Send + Sync + 'static> DataService<T> {
    /// Subscribe for rendering, starting from `default` until data arrives.
    pub fn use_data(&self, default: Vec<T>) -> UseData<T> {
        let (data_tx, data) = watch::channel(Arc::new(default));
        let (received_tx, received) = watch::channel(false);
        let status = self.status();

        let id = self.subscribe(move |collection| {
            data_tx.send_replace(Arc::clone(collection));
            received_tx.send_replace(true);
        });

        UseData {
            service: self.clone(),
            id,
            data,
            received,
            status,
        }
    }

    /// Subscribe as a stream. The cached collection, when present, is the
    /// first item.
    pub fn stream(&self) -> CollectionStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |collection| {
            // Receiver gone means the stream is being dropped.
            let _ = tx.send(Arc::clone(collection));
        });
        CollectionStream {
            service: self.clone(),
            id,
            rx,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;
    use crate::service::FetchFn;
    use crate::CoreError;

    fn service_with(items: Vec<&'static str>) -> DataService<&'static str> {
        DataService::new(
            "words",
            FetchFn(move || {
                let items = items.clone();
                async move { Ok::<_, CoreError>(items) }
            }),
        )
    }

    #[tokio::test]
    async fn use_data_starts_from_default_then_follows_fetch() {
        let service = service_with(vec!["fetched"]);
        let mut view = service.use_data(vec!["placeholder"]);

        let (data, loading) = view.current();
        assert_eq!(data.as_slice(), ["placeholder"]);
        assert!(loading);

        let (data, _) = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let (data, loading) = view.changed().await;
                if !loading {
                    return (data, loading);
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(data.as_slice(), ["fetched"]);
    }

    #[tokio::test]
    async fn dropping_use_data_unsubscribes() {
        let service = service_with(vec![]);
        service.post_new_data(vec!["x"]);
        {
            let view = service.use_data(Vec::new());
            assert_eq!(view.current().0.as_slice(), ["x"]);
            assert!(!view.is_loading());
            assert_eq!(service.subscriber_count(), 1);
        }
        assert_eq!(service.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn use_data_is_released_on_early_return() {
        fn render(service: &DataService<&'static str>) -> Result<usize, CoreError> {
            let view = service.use_data(Vec::new());
            let (data, _) = view.current();
            if data.is_empty() {
                return Err(CoreError::Internal("nothing to render".into()));
            }
            Ok(data.len())
        }

        let service = service_with(vec![]);
        service.post_new_data(Vec::new());
        assert!(render(&service).is_err());
        assert_eq!(service.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_yields_every_publish_in_order() {
        let service = service_with(vec![]);
        service.post_new_data(vec!["a"]);
        let mut stream = service.stream();

        service.post_new_data(vec!["b"]);
        service.post_new_data(vec!["c"]);

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(stream.next().await.unwrap().as_ref().clone());
        }
        assert_eq!(seen, vec![vec!["a"], vec!["b"], vec!["c"]]);

        drop(stream);
        assert_eq!(service.subscriber_count(), 0);
    }
}
