//! A promise runs its work once and memoizes the outcome for any number of
//! readers.
//!
//! Readers either block in [`Promise::resolve`] or await the
//! [`Resolution`] returned by [`Promise::resolve_async`]. Each resolution is
//! its own one-shot handle, so late readers never race early ones for a
//! single token.
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, OnceLock, PoisonError,
};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::executor::block_on;

use crate::{work, Builder, Error, Outcome, Rejecter, Resolver};

struct Shared<T> {
    launched: AtomicBool,
    outcome: OnceLock<Arc<Outcome<T>>>,
    waiters: Mutex<Vec<oneshot::Sender<Arc<Outcome<T>>>>>,
}

impl<T> Shared<T> {
    fn waiters(&self) -> MutexGuard<'_, Vec<oneshot::Sender<Arc<Outcome<T>>>>> {
        // Nothing in the critical section can panic half-way.
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commits `outcome` and hands it to every waiting resolution. Only the
    /// first call has any effect.
    fn publish(&self, label: &str, outcome: Outcome<T>) {
        let outcome = Arc::new(outcome);
        if self.outcome.set(outcome.clone()).is_err() {
            tracing::debug!(promise = %label, "promise already settled, dropping outcome");
            return;
        }
        tracing::debug!(
            promise = %label,
            fulfilled = outcome.is_fulfilled(),
            "promise settled"
        );
        let waiters = mem::take(&mut *self.waiters());
        for waiter in waiters {
            // A dropped resolution is not interested any more.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Handle to work running on its own thread, and to its memoized
/// [`Outcome`].
///
/// Cloning the handle is cheap; all clones observe the same promise.
///
/// # Examples
///
/// ```
/// use promise_once::Promise;
/// use futures::executor::block_on;
///
/// let promise = Promise::new(|resolve, _reject| resolve.resolve(String::from("🍓")));
/// let outcome = promise.resolve();
/// assert_eq!(outcome.value().map(String::as_str), Some("🍓"));
///
/// // Later readers get the very same outcome.
/// let again = block_on(promise.resolve_async());
/// assert!(std::sync::Arc::ptr_eq(&outcome, &again));
/// ```
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.shared.outcome.get() {
            None if self.shared.launched.load(Ordering::Acquire) => "pending",
            None => "idle",
            Some(outcome) if outcome.is_fulfilled() => "fulfilled",
            Some(_) => "rejected",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}

impl<T> Promise<T>
where
    T: Send + Sync + 'static,
{
    /// Builds a promise and immediately starts `work` on a new thread.
    ///
    /// `work` must call exactly one of its callbacks. If it drops both
    /// without calling either, the promise is rejected with
    /// [`Error::Abandoned`]. Work that keeps a callback alive and never
    /// reports leaves [`resolve`](Self::resolve) blocked forever.
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        Builder::default().spawn(work)
    }

    pub(crate) fn pending() -> Self {
        Self {
            shared: Arc::new(Shared {
                launched: AtomicBool::new(false),
                outcome: OnceLock::new(),
                waiters: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Starts `work` unless some work was already started for this promise.
    pub(crate) fn launch<F>(&self, builder: &Builder, work: F)
    where
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        if self
            .shared
            .launched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!(promise = %builder.label(), "promise work already launched");
            return;
        }

        let (resolve, reject, reports) = work::callbacks();
        let shared = self.shared.clone();
        let label = builder.label().to_owned();
        let work_thread = builder.work_thread();

        tracing::debug!(promise = %label, "launching promise work");
        let launched = builder.launcher_thread().spawn(move || {
            if let Err(err) = work_thread.spawn(move || work(resolve, reject)) {
                tracing::warn!(promise = %label, error = %err, "failed to spawn promise work thread");
                shared.publish(&label, Outcome::rejected(Error::Spawn(err)));
                return;
            }
            let outcome = match reports.recv() {
                Ok(result) => Outcome::from(result),
                Err(_) => {
                    tracing::warn!(promise = %label, "promise work dropped its callbacks without reporting");
                    Outcome::rejected(Error::Abandoned)
                }
            };
            shared.publish(&label, outcome);
        });

        if let Err(err) = launched {
            tracing::warn!(promise = %builder.label(), error = %err, "failed to spawn promise launcher thread");
            self.shared
                .publish(builder.label(), Outcome::rejected(Error::Spawn(err)));
        }
    }

    /// Blocks the calling thread until the promise settles and returns its
    /// outcome. Returns at once if it already settled.
    ///
    /// Every call on a settled promise returns the same `Arc`.
    pub fn resolve(&self) -> Arc<Outcome<T>> {
        match self.shared.outcome.get() {
            Some(outcome) => outcome.clone(),
            None => block_on(self.resolve_async()),
        }
    }

    /// Returns a fresh one-shot handle that yields the outcome once the
    /// promise settles, or right away if it already has.
    ///
    /// Never blocks. Each call returns an independent handle.
    pub fn resolve_async(&self) -> Resolution<T> {
        let (sender, receiver) = oneshot::channel();
        {
            let mut waiters = self.shared.waiters();
            match self.shared.outcome.get() {
                Some(outcome) => {
                    let _ = sender.send(outcome.clone());
                }
                None => {
                    // Resolutions dropped before settlement leave canceled senders.
                    waiters.retain(|waiter| !waiter.is_canceled());
                    waiters.push(sender);
                }
            }
        }
        Resolution { receiver }
    }

    /// The outcome, if the promise has settled.
    pub fn try_outcome(&self) -> Option<Arc<Outcome<T>>> {
        self.shared.outcome.get().cloned()
    }

    pub fn is_settled(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.shared
            .outcome
            .get()
            .is_some_and(|outcome| outcome.is_fulfilled())
    }

    pub fn is_rejected(&self) -> bool {
        self.shared
            .outcome
            .get()
            .is_some_and(|outcome| outcome.is_rejected())
    }
}

/// Future returned by [`Promise::resolve_async`].
///
/// Yields the promise's outcome exactly once. If the promise is dropped
/// without its work ever being started, it yields [`Error::Abandoned`].
#[derive(Debug)]
#[must_use = "a resolution does nothing unless awaited"]
pub struct Resolution<T> {
    receiver: oneshot::Receiver<Arc<Outcome<T>>>,
}

impl<T> Future for Resolution<T> {
    type Output = Arc<Outcome<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => {
                Poll::Ready(Arc::new(Outcome::rejected(Error::Abandoned)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
