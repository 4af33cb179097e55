use std::future::Future;

use futures_util::future::BoxFuture;

use crate::error::CoreError;

/// Capability to retrieve the full collection for a resource.
///
/// Called once per fetch cycle, possibly concurrently with an older
/// cycle still in flight; implementations must be safe to repeat.
pub trait Fetch<T>: Send + Sync + 'static {
    fn fetch_data(&self) -> BoxFuture<'_, Result<Vec<T>, CoreError>>;
}

/// Adapts an async closure into a [`Fetch`] implementation.
pub struct FetchFn<F>(pub F);

impl<T, F, Fut> Fetch<T> for FetchFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, CoreError>> + Send + 'static,
{
    fn fetch_data(&self) -> BoxFuture<'_, Result<Vec<T>, CoreError>> {
        Box::pin((self.0)())
    }
}
