//! Error types
//!
//! [`HttpError`] is what transports and interceptors speak. [`RequestError`] is what an
//! [`Adapter`](crate::Adapter) hands back to its caller: the failure tagged with the adapter
//! kind so that its display reads `FetchError: ...` or `AxiosError: ...`.

use thiserror::Error;

use crate::adapter::AdapterKind;
use crate::response::Envelope;

/// Failure raised below the adapter: by a transport, or by an interceptor that rejects
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// The transport reported a status it could not complete the exchange with
    #[error("status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Transport message
        message: String,
    },
    /// The peer could not be reached
    #[error("connection failed: {0}")]
    Connection(String),
    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,
    /// A body could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// The proxy URL was rejected
    #[error("invalid proxy: {0}")]
    Proxy(String),
    /// The transport could not be built from its settings
    #[error("transport build failed: {0}")]
    Build(String),
    /// Anything else, including interceptor rejections
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return HttpError::Timeout;
        }
        if err.is_builder() {
            return HttpError::Build(err.to_string());
        }
        if err.is_connect() {
            return HttpError::Connection(err.to_string());
        }
        match err.status() {
            Some(status) => HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => HttpError::Other(err.to_string()),
        }
    }
}

#[cfg(feature = "bitreq")]
impl From<bitreq::Error> for HttpError {
    fn from(err: bitreq::Error) -> Self {
        use std::io::ErrorKind;

        match err {
            bitreq::Error::InvalidUtf8InBody(_) | bitreq::Error::InvalidUtf8InResponse => {
                HttpError::Serialization(err.to_string())
            }
            bitreq::Error::AddressNotFound => HttpError::Connection(err.to_string()),
            bitreq::Error::IoError(io_err) => match io_err.kind() {
                ErrorKind::TimedOut => HttpError::Timeout,
                ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::NotConnected => HttpError::Connection(io_err.to_string()),
                _ => HttpError::Other(io_err.to_string()),
            },
            _ => HttpError::Other(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

/// Why a verb call failed
#[derive(Debug, Clone, Error)]
pub enum Failure {
    /// The transport (or an interceptor) failed before a response was accepted
    #[error(transparent)]
    Transport(#[from] HttpError),
    /// The response body is not valid JSON
    #[error("invalid json response body: {0}")]
    Decode(String),
    /// The request body could not be serialized
    #[error("invalid json request body: {0}")]
    Encode(String),
    /// The response status was rejected by the adapter's status policy
    #[error("{0}")]
    Status(Envelope),
}

/// Error returned by every adapter verb
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .kind.error_prefix(), .failure)]
pub struct RequestError {
    kind: AdapterKind,
    failure: Failure,
}

impl RequestError {
    /// Tag a failure with the adapter kind that observed it
    pub fn new(kind: AdapterKind, failure: impl Into<Failure>) -> Self {
        Self {
            kind,
            failure: failure.into(),
        }
    }

    /// Adapter kind that produced the error
    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// Underlying failure
    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    /// Consume the error, returning the underlying failure
    pub fn into_failure(self) -> Failure {
        self.failure
    }

    /// Status code, when the failure carries one
    pub fn status(&self) -> Option<u16> {
        match &self.failure {
            Failure::Status(envelope) => Some(envelope.status),
            Failure::Transport(HttpError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_error_prefix_fetch() {
        let error = RequestError::new(AdapterKind::Fetch, HttpError::Timeout);
        assert_eq!(error.to_string(), "FetchError: request timed out");
    }

    #[test]
    fn test_request_error_prefix_axios() {
        let error = RequestError::new(
            AdapterKind::Axios,
            HttpError::Connection("refused".to_string()),
        );
        assert_eq!(error.to_string(), "AxiosError: connection failed: refused");
    }

    #[test]
    fn test_request_error_carries_serialized_envelope() {
        let envelope = Envelope {
            data: json!({"error": "missing"}),
            status: 404,
        };
        let error = RequestError::new(AdapterKind::Fetch, Failure::Status(envelope));

        assert_eq!(
            error.to_string(),
            r#"FetchError: {"data":{"error":"missing"},"status":404}"#
        );
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_request_error_status_absent_for_decode() {
        let error = RequestError::new(AdapterKind::Fetch, Failure::Decode("eof".to_string()));
        assert_eq!(error.status(), None);
        assert!(matches!(error.failure(), Failure::Decode(_)));
    }

    #[test]
    fn test_request_error_status_from_transport() {
        let error = RequestError::new(
            AdapterKind::Axios,
            HttpError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            },
        );
        assert_eq!(error.status(), Some(502));
        assert_eq!(error.to_string(), "AxiosError: status 502: bad gateway");
    }

    #[test]
    fn test_request_error_encode_failure() {
        let error = RequestError::new(AdapterKind::Fetch, Failure::Encode("nan".to_string()));
        assert_eq!(error.to_string(), "FetchError: invalid json request body: nan");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_into_failure_keeps_interceptor_rejection() {
        let error = RequestError::new(
            AdapterKind::Fetch,
            HttpError::Other("blocked by interceptor".to_string()),
        );
        assert_eq!(error.kind(), AdapterKind::Fetch);
        assert!(matches!(
            error.into_failure(),
            Failure::Transport(HttpError::Other(message)) if message == "blocked by interceptor"
        ));
    }
}
