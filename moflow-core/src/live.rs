//! Live queries: a query that re-runs every time the store reports a write.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::watch;

use moflow_types::AppError;

type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send>>;
type Fetch<T> = Box<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// A re-emitting view over the store.
///
/// The first [`Live::next`] yields the current result straight away. Each
/// later call waits for the next committed write and yields a fresh result.
/// Several writes landing between two calls collapse into one emission.
pub struct Live<T> {
    changes: watch::Receiver<u64>,
    fetch: Fetch<T>,
    primed: bool,
}

impl<T> Live<T> {
    pub fn new<F, Fut>(changes: watch::Receiver<u64>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        Self {
            changes,
            fetch: Box::new(move || Box::pin(fetch())),
            primed: false,
        }
    }

    /// Waits for the next snapshot. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Result<T, AppError>> {
        if self.primed {
            self.changes.changed().await.ok()?;
        }
        self.primed = true;
        self.changes.borrow_and_update();
        Some((self.fetch)().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_live(rx: watch::Receiver<u64>) -> (Live<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let live = Live::new(rx, move || {
            let counter = Arc::clone(&counter);
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
        });
        (live, calls)
    }

    #[tokio::test]
    async fn test_first_emission_is_immediate() {
        let (_tx, rx) = watch::channel(0u64);
        let (mut live, _) = counting_live(rx);

        assert_eq!(live.next().await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_writes_between_polls_collapse() {
        let (tx, rx) = watch::channel(0u64);
        let (mut live, calls) = counting_live(rx);
        live.next().await.unwrap().unwrap();

        tx.send_modify(|v| *v += 1);
        tx.send_modify(|v| *v += 1);

        assert_eq!(live.next().await.unwrap().unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ends_when_sender_dropped() {
        let (tx, rx) = watch::channel(0u64);
        let (mut live, _) = counting_live(rx);
        live.next().await.unwrap().unwrap();

        drop(tx);

        assert!(live.next().await.is_none());
    }
}
