//! Warm-up hook run at the start of every invocation.

use std::future::Future;
use std::sync::Arc;

use axum::BoxError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

type HookFn = dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync;

/// An async hook awaited before any application work in an invocation.
///
/// Runs once per invocation, so anything expensive should be memoized by
/// the hook itself (e.g. behind a `tokio::sync::OnceCell`).
#[derive(Clone)]
pub struct BeforeStart(Arc<HookFn>);

impl BeforeStart {
    pub fn new<F, Fut>(hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self(Arc::new(move || hook().boxed()))
    }

    pub async fn run(&self) -> Result<(), BoxError> {
        (self.0)().await
    }
}

impl std::fmt::Debug for BeforeStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BeforeStart(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_runs_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let hook = BeforeStart::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            }
        });

        hook.run().await.unwrap();
        hook.clone().run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_returned() {
        let hook = BeforeStart::new(|| async { Err::<(), BoxError>("secrets unavailable".into()) });
        assert_eq!(hook.run().await.unwrap_err().to_string(), "secrets unavailable");
    }
}
