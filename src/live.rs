//! Push-based value streams ("live sequences") that the store publishes and the aggregator reads.

use tokio::sync::{mpsc, watch};

/// A stream of whole snapshots. `next` waits for the following value and returns `None` once the
/// producer is gone.
#[async_trait::async_trait]
pub trait LiveSequence<T>: Send {
    async fn next(&mut self) -> Option<T>;
}

/// Latest-value semantics: intermediate values that were replaced before `next` was polled are
/// skipped. A receiver that was marked changed yields the current value first.
#[async_trait::async_trait]
impl<T> LiveSequence<T> for watch::Receiver<T>
where
    T: Clone + Send + Sync,
{
    async fn next(&mut self) -> Option<T> {
        self.changed().await.ok()?;
        Some(self.borrow_and_update().clone())
    }
}

#[async_trait::async_trait]
impl<T> LiveSequence<T> for mpsc::Receiver<T>
where
    T: Send,
{
    async fn next(&mut self) -> Option<T> {
        self.recv().await
    }
}

/// Maps every snapshot of an inner sequence through a function, typically to filter the list it
/// carries.
pub struct Filtered<S, F> {
    inner: S,
    f: F,
}

impl<S, F> Filtered<S, F> {
    pub fn new(inner: S, f: F) -> Self {
        Self { inner, f }
    }
}

#[async_trait::async_trait]
impl<T, S, F> LiveSequence<T> for Filtered<S, F>
where
    T: Send,
    S: LiveSequence<T>,
    F: Fn(T) -> T + Send,
{
    async fn next(&mut self) -> Option<T> {
        let value = self.inner.next().await?;
        Some((self.f)(value))
    }
}

/// A boxed live sequence, as handed out by the store.
pub type BoxedSequence<T> = Box<dyn LiveSequence<T>>;
