use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{Builder, Outcome, Promise, Rejecter, Resolution, Resolver};

/// A [`Promise`] whose work is supplied later, through [`run`](Self::run).
///
/// Only the first `run` starts anything; later calls, concurrent ones
/// included, do nothing. Until then [`is_fulfilled`](Self::is_fulfilled) and
/// [`is_rejected`](Self::is_rejected) are both false.
///
/// Resolving before `run` waits for some other caller to run it. Nothing
/// stops a thread from blocking forever in [`resolve`](Self::resolve) on a
/// promise that is never run.
///
/// # Examples
///
/// ```
/// use promise_once::DeferredPromise;
///
/// let deferred = DeferredPromise::new();
/// assert!(!deferred.is_started());
///
/// deferred.run(|resolve, _reject| resolve.resolve(1u32));
/// deferred.run(|resolve, _reject| resolve.resolve(2u32));
///
/// assert!(deferred.is_started());
/// assert_eq!(deferred.resolve().value(), Some(&1));
/// ```
pub struct DeferredPromise<T> {
    promise: Promise<T>,
    started: Arc<AtomicBool>,
    builder: Builder,
}

impl<T> Clone for DeferredPromise<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            started: self.started.clone(),
            builder: self.builder.clone(),
        }
    }
}

impl<T> fmt::Debug for DeferredPromise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPromise")
            .field("started", &self.is_started())
            .field("promise", &self.promise)
            .finish()
    }
}

impl<T> Default for DeferredPromise<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredPromise<T> {
    /// Whether `run` has been called, whether or not the work finished.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl<T> DeferredPromise<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_builder(Builder::default())
    }

    pub(crate) fn with_builder(builder: Builder) -> Self {
        Self {
            promise: Promise::pending(),
            started: Arc::new(AtomicBool::new(false)),
            builder,
        }
    }

    /// Starts `work` if this is the first call; otherwise does nothing.
    pub fn run<F>(&self, work: F)
    where
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!(promise = %self.builder.label(), "deferred promise already started");
            return;
        }
        self.promise.launch(&self.builder, work);
    }

    pub fn is_fulfilled(&self) -> bool {
        self.is_started() && self.promise.is_fulfilled()
    }

    pub fn is_rejected(&self) -> bool {
        self.is_started() && self.promise.is_rejected()
    }

    pub fn is_settled(&self) -> bool {
        self.is_started() && self.promise.is_settled()
    }

    /// See [`Promise::resolve`]. Blocks until `run` is called somewhere and
    /// the work settles.
    pub fn resolve(&self) -> Arc<Outcome<T>> {
        self.promise.resolve()
    }

    /// See [`Promise::resolve_async`].
    pub fn resolve_async(&self) -> Resolution<T> {
        self.promise.resolve_async()
    }

    pub fn try_outcome(&self) -> Option<Arc<Outcome<T>>> {
        self.promise.try_outcome()
    }

    /// The underlying promise.
    pub fn promise(&self) -> &Promise<T> {
        &self.promise
    }
}

#[cfg(test)]
mod tests {
    use super::DeferredPromise;
    use crate::Builder;
    use futures::executor::block_on;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    };
    use std::thread;

    #[test]
    fn test_idle_flags() {
        let deferred = DeferredPromise::<u32>::new();
        assert!(!deferred.is_started());
        assert!(!deferred.is_fulfilled());
        assert!(!deferred.is_rejected());
        assert!(!deferred.is_settled());
        assert!(deferred.try_outcome().is_none());
    }

    #[test]
    fn test_resolve_async_before_run() {
        let deferred = Builder::new().name("later").deferred::<String>();
        let resolution = deferred.resolve_async();
        let runner = deferred.clone();
        let task = thread::spawn(move || {
            runner.run(|resolve, _reject| resolve.resolve("ran".to_owned()));
        });
        let outcome = block_on(resolution);
        task.join().expect("The runner thread has panicked");
        assert_eq!(outcome.value().map(String::as_str), Some("ran"));
        assert!(deferred.is_fulfilled());
    }

    #[test]
    fn test_concurrent_run_executes_once() {
        const RUNNERS: usize = 16;
        let counter = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(RUNNERS));
        let deferred = DeferredPromise::<usize>::new();

        let tasks: Vec<_> = (0..RUNNERS)
            .map(|_| {
                let deferred = deferred.clone();
                let counter = counter.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    deferred.run(move |resolve, _reject| {
                        resolve.resolve(counter.fetch_add(1, Ordering::SeqCst) + 1);
                    });
                })
            })
            .collect();
        for task in tasks {
            task.join().expect("A runner thread has panicked");
        }

        assert_eq!(deferred.resolve().value(), Some(&1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejected_after_run() {
        let deferred = DeferredPromise::<()>::new();
        deferred.run(|_resolve, reject| reject.reject("nope"));
        let outcome = deferred.resolve();
        assert!(deferred.is_rejected());
        assert!(!deferred.is_fulfilled());
        assert_eq!(outcome.error().unwrap().to_string(), "nope");
        assert!(format!("{deferred:?}").contains("started: true"));
    }
}
