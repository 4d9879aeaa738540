//! The callback pair handed to promise work.
//!
//! Work is any `FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static`. It is
//! called once, on its own thread, and must report exactly one outcome.
//! It receives a [`Resolver`] and a [`Rejecter`] that share one private
//! single-slot channel back to the promise's launcher thread. Only the
//! first report is sent; any later report is dropped on the spot, so a
//! work function that reports twice never blocks.
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{sync_channel, Receiver, SyncSender, TrySendError},
    Arc,
};

use crate::{error::BoxError, Error};

struct Report<T> {
    claimed: AtomicBool,
    sender: SyncSender<Result<T, Error>>,
}

impl<T> Report<T> {
    fn send(&self, outcome: Result<T, Error>) {
        if self.claimed.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                fulfilled = outcome.is_ok(),
                "promise already has an outcome, dropping report"
            );
            return;
        }
        match self.sender.try_send(outcome) {
            Ok(()) => {}
            // The slot is only ever written once, so it cannot be full.
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("promise launcher is gone, dropping report");
            }
        }
    }
}

/// Reports success. Cheap to clone; clones share the same slot.
pub struct Resolver<T> {
    report: Arc<Report<T>>,
}

/// Reports failure. Cheap to clone; clones share the same slot.
pub struct Rejecter<T> {
    report: Arc<Report<T>>,
}

impl<T> Resolver<T> {
    /// Fulfils the promise with `value` unless it already has an outcome.
    pub fn resolve(&self, value: T) {
        self.report.send(Ok(value));
    }
}

impl<T> Rejecter<T> {
    /// Rejects the promise with `err` unless it already has an outcome.
    pub fn reject(&self, err: impl Into<BoxError>) {
        self.report.send(Err(Error::rejected(err)));
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self { report: self.report.clone() }
    }
}

impl<T> Clone for Rejecter<T> {
    fn clone(&self) -> Self {
        Self { report: self.report.clone() }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("claimed", &self.report.claimed.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> fmt::Debug for Rejecter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter")
            .field("claimed", &self.report.claimed.load(Ordering::Acquire))
            .finish()
    }
}

/// Creates the callback pair and the receiving end of their slot.
///
/// The receiver sees `RecvError` once every callback clone is dropped
/// without a report.
pub(crate) fn callbacks<T>() -> (Resolver<T>, Rejecter<T>, Receiver<Result<T, Error>>) {
    let (sender, receiver) = sync_channel(1);
    let report = Arc::new(Report {
        claimed: AtomicBool::new(false),
        sender,
    });
    (
        Resolver { report: report.clone() },
        Rejecter { report },
        receiver,
    )
}

#[cfg(test)]
mod tests {
    use super::callbacks;
    use std::thread;

    #[test]
    fn test_first_report_wins() {
        let (resolve, reject, receiver) = callbacks::<u32>();
        resolve.resolve(1);
        reject.reject("late");
        resolve.resolve(2);
        assert_eq!(receiver.recv().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_surplus_reports_do_not_block() {
        let (resolve, reject, receiver) = callbacks::<u32>();
        let task = thread::spawn(move || {
            reject.reject("first");
            for n in 0..4 {
                resolve.resolve(n);
            }
        });
        task.join().expect("The reporting thread has panicked");
        let err = receiver.recv().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn test_dropped_callbacks_disconnect() {
        let (resolve, reject, receiver) = callbacks::<u32>();
        let extra = resolve.clone();
        drop(resolve);
        drop(reject);
        drop(extra);
        assert!(receiver.recv().is_err());
    }

    #[test]
    fn test_report_after_receiver_dropped() {
        let (resolve, _reject, receiver) = callbacks::<u32>();
        drop(receiver);
        resolve.resolve(5);
    }
}
