//! Global error observer
//!
//! An observer sees every error an adapter returns, after it is built and before it is
//! handed to the caller. It receives the error by reference and returns nothing, so it
//! cannot swallow or rewrite the failure.

use crate::error::RequestError;

/// Side-effecting hook invoked once per failed verb call
pub trait ErrorObserver: Send + Sync {
    /// Called with the error about to be returned
    fn on_error(&self, error: &RequestError);
}

impl<F> ErrorObserver for F
where
    F: Fn(&RequestError) + Send + Sync,
{
    fn on_error(&self, error: &RequestError) {
        self(error)
    }
}

/// Observer that reports failures through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ErrorObserver for TracingObserver {
    fn on_error(&self, error: &RequestError) {
        match error.status() {
            Some(status) => tracing::error!(status, "{}", error),
            None => tracing::error!("{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::adapter::AdapterKind;
    use crate::error::HttpError;

    #[test]
    fn test_closure_observer() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let observer = move |error: &RequestError| {
            assert_eq!(error.kind(), AdapterKind::Axios);
            seen.fetch_add(1, Ordering::SeqCst);
        };

        observer.on_error(&RequestError::new(AdapterKind::Axios, HttpError::Timeout));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tracing_observer_does_not_panic() {
        TracingObserver.on_error(&RequestError::new(AdapterKind::Fetch, HttpError::Timeout));
    }
}
