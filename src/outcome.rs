use crate::Error;

/// The settled result of a promise: a value if it was fulfilled, an
/// [`Error`] if it was rejected.
///
/// An `Outcome` never changes once created. Promises hand it out as an
/// `Arc<Outcome<T>>` so every reader shares the same instance.
#[derive(Debug)]
pub struct Outcome<T> {
    inner: Result<T, Error>,
}

impl<T> Outcome<T> {
    pub fn fulfilled(value: T) -> Self {
        Self { inner: Ok(value) }
    }

    pub fn rejected(err: Error) -> Self {
        Self { inner: Err(err) }
    }

    /// The value, present only when fulfilled.
    pub fn value(&self) -> Option<&T> {
        self.inner.as_ref().ok()
    }

    /// The error, present only when rejected.
    pub fn error(&self) -> Option<&Error> {
        self.inner.as_ref().err()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.inner.is_ok()
    }

    pub fn is_rejected(&self) -> bool {
        self.inner.is_err()
    }

    pub fn as_result(&self) -> Result<&T, &Error> {
        self.inner.as_ref()
    }

    pub fn into_result(self) -> Result<T, Error> {
        self.inner
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(inner: Result<T, Error>) -> Self {
        Self { inner }
    }
}
