use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use url::Url;

/// A write-once latch bridging one producer to any number of waiters.
///
/// The first `complete` wins; later writes are no-ops. Waiters observe
/// either the completed value or `None` when the producer was dropped
/// without completing, so a cancelled compile can never leave a waiter
/// pending.
///
pub struct Promise<T: Clone> {
    tx: Mutex<Option<oneshot::Sender<T>>>,
    rx: Shared<BoxFuture<'static, Option<T>>>,
}

impl<T: Clone> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("completed", &self.tx.lock().unwrap().is_none())
            .finish()
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        let rx = async move { rx.await.ok() }.boxed().shared();
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Complete the promise. Returns true iff this call performed the
    /// completion; a second write is a no-op returning false.
    ///
    pub fn complete(&self, value: T) -> bool {
        match self.tx.lock().unwrap().take() {
            Some(tx) => {
                // A send error only means every waiter is gone already.
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.tx.lock().unwrap().is_none()
    }

    /// An awaitable handle onto the promise. Resolves to `None` iff the
    /// promise was dropped uncompleted.
    ///
    pub fn wait(&self) -> Shared<BoxFuture<'static, Option<T>>> {
        self.rx.clone()
    }
}

impl<T> Default for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Why a pickle promise terminated without carrying a pickle.
///
/// These are plain data, not exceptions: downstream waiters pattern-match
/// on them to decide whether to proceed, warn, or block.
///
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PromiseCut {
    /// The pickle phase was skipped on purpose: non-pipelined traversal, an
    /// early result, or a compiler that chose not to pickle.
    Completed,

    /// The producing compilation failed; downstream must abort.
    Failed,

    /// The producing node was never compiled because one of its own
    /// upstreams failed.
    Blocked,
}

/// Terminal state of a node's pickle promise.
///
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PickleOutcome {
    /// The compiler wrote pickles and published their location.
    Produced(Url),

    /// The compiler completed the promise explicitly with no value.
    Empty,

    Cut(PromiseCut),
}

/// Terminal state of a node's java-complete promise.
///
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum JavaOutcome {
    Finished,
    Aborted,
}

/// One-shot signal that a node's pickles are ready (or never will be).
pub type PicklePromise = Arc<Promise<PickleOutcome>>;

/// One-shot signal that a node's java compilation has finished.
pub type JavaLatch = Arc<Promise<JavaOutcome>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waiters_observe_the_completed_value() {
        let promise: Promise<u32> = Promise::new();
        let wait = promise.wait();
        assert!(promise.complete(42));
        assert_eq!(wait.await, Some(42));
    }

    #[tokio::test]
    async fn every_waiter_observes_the_same_value() {
        let promise: Arc<Promise<u32>> = Arc::new(Promise::new());
        let first = promise.wait();
        let second = promise.wait();

        let waiter = {
            let promise = promise.clone();
            tokio::spawn(async move { promise.wait().await })
        };

        promise.complete(7);
        assert_eq!(first.await, Some(7));
        assert_eq!(second.await, Some(7));
        assert_eq!(waiter.await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn the_first_write_wins() {
        let promise: Promise<&str> = Promise::new();
        assert!(!promise.is_completed());
        assert!(promise.complete("first"));
        assert!(promise.is_completed());
        assert!(!promise.complete("second"));
        assert_eq!(promise.wait().await, Some("first"));
    }

    #[tokio::test]
    async fn a_dropped_promise_resolves_waiters_with_none() {
        let promise: Promise<u32> = Promise::new();
        let wait = promise.wait();
        drop(promise);
        assert_eq!(wait.await, None);
    }

    #[tokio::test]
    async fn waiting_after_completion_resolves_immediately() {
        let promise: Promise<PickleOutcome> = Promise::new();
        promise.complete(PickleOutcome::Cut(PromiseCut::Completed));
        assert_eq!(
            promise.wait().await,
            Some(PickleOutcome::Cut(PromiseCut::Completed))
        );
    }
}
