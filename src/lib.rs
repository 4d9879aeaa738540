//! Run-once promises for threaded code.
//!
//! A [`Promise`] runs a piece of work on its own thread, exactly once, and
//! keeps the first [`Outcome`] the work reports. Any number of readers can
//! block on it with [`Promise::resolve`] or await [`Promise::resolve_async`],
//! before or after it settles. A [`DeferredPromise`] is built idle and
//! starts its work on the first [`DeferredPromise::run`].
//!
//! # Examples
//!
//! ```
//! use promise_once::Promise;
//! use futures::executor::block_on;
//! use std::thread;
//!
//! let promise = Promise::new(|resolve, reject| {
//!     match "42".parse::<u32>() {
//!         Ok(n) => resolve.resolve(n),
//!         Err(err) => reject.reject(err),
//!     }
//! });
//!
//! let reader = promise.clone();
//! let task = thread::spawn(move || block_on(reader.resolve_async()));
//!
//! assert_eq!(promise.resolve().value(), Some(&42));
//! assert!(task.join().unwrap().is_fulfilled());
//! ```
mod builder;
mod deferred;
mod error;
mod outcome;
mod promise;
mod work;

pub use builder::Builder;
pub use deferred::DeferredPromise;
pub use error::{BoxError, Error};
pub use outcome::Outcome;
pub use promise::{Promise, Resolution};
pub use work::{Rejecter, Resolver};
