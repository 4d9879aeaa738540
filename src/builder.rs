use std::thread;

use crate::{DeferredPromise, Promise, Rejecter, Resolver};

const DEFAULT_NAME: &str = "promise";

/// Promise factory, which can be used in order to configure the threads a
/// promise runs on.
///
/// Every promise uses two threads: a launcher named `"{name}-launcher"`
/// that waits for the first report and commits it, and the work thread
/// named `"{name}-work"`.
///
/// # Examples
///
/// ```
/// use promise_once::Builder;
///
/// let promise = Builder::new()
///     .name("answer")
///     .spawn(|resolve, _reject| resolve.resolve(42u32));
/// assert_eq!(promise.resolve().value(), Some(&42));
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    name: String,
    stack_size: Option<usize>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            stack_size: None,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base name for the promise's threads; also tags its log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stack size in bytes for the work thread. The launcher keeps the
    /// platform default.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Builds a promise and starts `work` right away.
    pub fn spawn<T, F>(self, work: F) -> Promise<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        let promise = Promise::pending();
        promise.launch(&self, work);
        promise
    }

    /// Builds a promise that waits for [`DeferredPromise::run`].
    pub fn deferred<T>(self) -> DeferredPromise<T>
    where
        T: Send + Sync + 'static,
    {
        DeferredPromise::with_builder(self)
    }

    pub(crate) fn label(&self) -> &str {
        &self.name
    }

    pub(crate) fn launcher_thread(&self) -> thread::Builder {
        thread::Builder::new().name(format!("{}-launcher", self.name))
    }

    pub(crate) fn work_thread(&self) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("{}-work", self.name));
        match self.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Builder;
    use std::thread;

    #[test]
    fn test_threads_are_named() {
        let promise = Builder::new()
            .name("lookup")
            .stack_size(256 * 1024)
            .spawn(|resolve, _reject| {
                resolve.resolve(thread::current().name().map(str::to_owned));
            });
        let outcome = promise.resolve();
        assert_eq!(outcome.value(), Some(&Some("lookup-work".to_owned())));
    }

    #[test]
    fn test_default_name() {
        let builder = Builder::default();
        assert_eq!(builder.label(), "promise");
    }
}
