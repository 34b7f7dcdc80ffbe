//! HTTP Transport trait

use std::fmt::Debug;
use std::sync::Arc;

use crate::request::HttpRequest;
use crate::response::{Response, TransportResponse};

/// Underlying network-call primitive an [`Adapter`](crate::Adapter) dispatches through
///
/// Implementations report any status the server returned as `Ok`; deciding which statuses
/// count as success is the adapter's job.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Dispatch one request
    async fn send(&self, request: HttpRequest) -> Response<TransportResponse>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Response<TransportResponse> {
        (**self).send(request).await
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: HttpRequest) -> Response<TransportResponse> {
        (**self).send(request).await
    }
}

/// Transport used when none is injected
///
/// reqwest when the `reqwest` feature is enabled, bitreq otherwise. `None` when the crate
/// was built without any backend.
pub fn default_transport() -> Option<Arc<dyn Transport>> {
    #[cfg(feature = "reqwest")]
    {
        Some(Arc::new(crate::backends::ReqwestTransport::new()))
    }
    #[cfg(all(not(feature = "reqwest"), feature = "bitreq"))]
    {
        Some(Arc::new(crate::backends::BitreqTransport::new()))
    }
    #[cfg(not(any(feature = "reqwest", feature = "bitreq")))]
    {
        None
    }
}
