use std::io;

/// Boxed error type accepted by [`Rejecter::reject`](crate::Rejecter::reject).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a promise was rejected.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The work reported a failure through its rejecter.
    #[error(transparent)]
    Rejected(BoxError),
    /// Every resolver and rejecter was dropped before an outcome was
    /// reported. A panicking work function ends up here too.
    #[error("promise work finished without reporting an outcome")]
    Abandoned,
    /// A launcher or work thread could not be spawned.
    #[error("failed to spawn promise thread: {0}")]
    Spawn(#[source] io::Error),
}

impl Error {
    /// Wraps any error as a work failure.
    pub fn rejected(err: impl Into<BoxError>) -> Self {
        Error::Rejected(err.into())
    }

    /// Returns the work failure as `E`, if that is what it is.
    ///
    /// ```
    /// use promise_once::Error;
    /// use std::io;
    ///
    /// let err = Error::rejected(io::Error::from(io::ErrorKind::TimedOut));
    /// let io_err = err.downcast_ref::<io::Error>().unwrap();
    /// assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
    /// ```
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Error::Rejected(source) => source.downcast_ref::<E>(),
            Error::Spawn(source) => {
                let source: &(dyn std::error::Error + 'static) = source;
                source.downcast_ref::<E>()
            }
            Error::Abandoned => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use std::io;

    #[test]
    fn test_rejected_is_transparent() {
        let err = Error::rejected("upstream refused");
        assert_eq!(err.to_string(), "upstream refused");
        assert!(err.downcast_ref::<io::Error>().is_none());
    }

    #[test]
    fn test_downcast_spawn_source() {
        let err = Error::Spawn(io::Error::from(io::ErrorKind::OutOfMemory));
        let source = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(source.kind(), io::ErrorKind::OutOfMemory);
        assert!(err.to_string().starts_with("failed to spawn promise thread"));
    }

    #[test]
    fn test_abandoned_has_no_source() {
        assert!(Error::Abandoned.downcast_ref::<io::Error>().is_none());
    }
}
