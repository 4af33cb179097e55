#![allow(clippy::unwrap_used)]
// Concurrency behaviour of `DataService`: fetch dedup, stale results,
// subscriber ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;

use casanet_core::{CoreError, DataService, FetchFn, FetchOutcome};

type Log = Arc<Mutex<Vec<Vec<u32>>>>;

fn recorder() -> (Log, impl Fn(&Arc<Vec<u32>>) + Send + Sync + 'static) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |data: &Arc<Vec<u32>>| {
        sink.lock().unwrap().push(data.as_ref().clone());
    })
}

/// Fetcher whose n-th call sleeps `delays[n]` and returns `[n + 1]`.
fn scripted(delays: Vec<Duration>, calls: Arc<AtomicUsize>) -> DataService<u32> {
    DataService::new(
        "scripted",
        FetchFn(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let delay = delays.get(n).copied().unwrap_or_default();
            async move {
                tokio::time::sleep(delay).await;
                Ok::<_, CoreError>(vec![u32::try_from(n).unwrap() + 1])
            }
        }),
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}

#[tokio::test(start_paused = true)]
async fn test_two_subscribers_share_one_initial_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = scripted(vec![Duration::from_millis(100)], Arc::clone(&calls));

    let (first, observer_a) = recorder();
    let (second, observer_b) = recorder();
    service.subscribe(observer_a);
    assert!(service.is_loading());
    service.subscribe(observer_b);

    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*first.lock().unwrap(), vec![vec![1]]);
    assert_eq!(*second.lock().unwrap(), vec![vec![1]]);
    assert!(!service.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_gets_cache_without_refetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = scripted(vec![Duration::ZERO], Arc::clone(&calls));

    let (_, observer) = recorder();
    service.subscribe(observer);
    settle().await;

    let (late, observer) = recorder();
    service.subscribe(observer);

    assert_eq!(*late.lock().unwrap(), vec![vec![1]]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_older_fetch_is_discarded() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = scripted(
        vec![Duration::from_millis(300), Duration::from_millis(10)],
        Arc::clone(&calls),
    );
    let (log, observer) = recorder();

    // First fetch comes from the subscribe, second from the refresh.
    service.subscribe(observer);
    tokio::task::yield_now().await;
    let newer = service.refresh().await.unwrap();
    assert!(matches!(newer, FetchOutcome::Applied(ref d) if d.as_slice() == [2]));

    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.cached().unwrap().as_slice(), [2]);
    assert_eq!(*log.lock().unwrap(), vec![vec![2]]);
    assert!(!service.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refreshes_keep_the_latest() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = scripted(
        vec![Duration::from_millis(200), Duration::from_millis(20)],
        Arc::clone(&calls),
    );

    let (older, newer) = tokio::join!(service.refresh(), service.refresh());

    assert!(matches!(older.unwrap(), FetchOutcome::Superseded));
    assert_eq!(newer.unwrap().applied().unwrap().as_slice(), [2]);
    assert_eq!(service.cached().unwrap().as_slice(), [2]);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_failure_does_not_record_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let service: DataService<u32> = DataService::new(
        "mixed",
        FetchFn(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Err(CoreError::Internal("late failure".into()))
                } else {
                    Ok(vec![9])
                }
            }
        }),
    );

    let (older, newer) = tokio::join!(service.refresh(), service.refresh());
    assert!(matches!(older.unwrap(), FetchOutcome::Superseded));
    assert!(newer.is_ok());
    assert!(service.status().borrow().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_observer_gets_nothing_more() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = scripted(vec![Duration::ZERO; 3], Arc::clone(&calls));
    let (log, observer) = recorder();

    let id = service.subscribe(observer);
    settle().await;
    assert!(service.unsubscribe(id));
    assert!(!service.unsubscribe(id));

    service.refresh().await.unwrap();
    service.post_new_data(vec![42]);

    assert_eq!(*log.lock().unwrap(), vec![vec![1]]);
    assert_eq!(service.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_every_subscriber_sees_the_same_sequence() {
    let service: DataService<u32> =
        DataService::new("seq", FetchFn(|| async { Ok::<_, CoreError>(vec![0]) }));
    service.post_new_data(vec![0]);

    let logs: Vec<Log> = (0..3)
        .map(|_| {
            let (log, observer) = recorder();
            service.subscribe(observer);
            log
        })
        .collect();

    for n in 1..=5 {
        service.post_new_data(vec![n]);
    }

    let expected: Vec<Vec<u32>> = (0..=5).map(|n| vec![n]).collect();
    for log in logs {
        assert_eq!(*log.lock().unwrap(), expected);
    }
}
