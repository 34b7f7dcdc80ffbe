//! Adapter-agnostic call surface

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::adapter::HttpAdapter;
use crate::error::{Failure, HttpError, RequestError};
use crate::query::QueryParams;
use crate::request::RequestOptions;
use crate::response::{Envelope, Response};

/// Request facade
///
/// Every verb forwards its arguments unchanged to the wrapped adapter and returns the
/// adapter's error as is.
#[derive(Debug)]
pub struct Request<A = Box<dyn HttpAdapter>> {
    adapter: A,
}

impl Request<Box<dyn HttpAdapter>> {
    /// Facade over a boxed adapter of any kind
    pub fn boxed<A: HttpAdapter + 'static>(adapter: A) -> Self {
        Self {
            adapter: Box::new(adapter),
        }
    }
}

impl<A: HttpAdapter> Request<A> {
    /// Facade over `adapter`
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// Wrapped adapter
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutable wrapped adapter
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Unwrap the adapter
    pub fn into_inner(self) -> A {
        self.adapter
    }

    /// GET
    pub async fn get(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.adapter.get(url, query, options).await
    }

    /// DELETE
    pub async fn delete(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.adapter.delete(url, query, body, options).await
    }

    /// PUT
    pub async fn put(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.adapter.put(url, query, body, options).await
    }

    /// PATCH
    pub async fn patch(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.adapter.patch(url, query, body, options).await
    }

    /// POST
    pub async fn post(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.adapter.post(url, query, body, options).await
    }

    /// Set or replace the bearer token on the adapter
    pub fn set_token(&mut self, token: &str) {
        self.adapter.set_token(token)
    }

    /// Remove the bearer token from the adapter
    pub fn clear_token(&mut self) {
        self.adapter.clear_token()
    }

    /// GET, deserializing `data` into `R`
    ///
    /// A `data` shape mismatch is returned as a decode failure; it is not reported to the
    /// adapter's error observer.
    pub async fn get_json<R>(
        &self,
        url: &str,
        query: Option<&QueryParams>,
    ) -> Response<R, RequestError>
    where
        R: DeserializeOwned,
    {
        let envelope = self.get(url, query, None).await?;
        self.decode(envelope)
    }

    /// POST a serializable body, deserializing `data` into `R`
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> Response<R, RequestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|err| {
            RequestError::new(self.adapter.kind(), Failure::Encode(err.to_string()))
        })?;
        let envelope = self.post(url, None, Some(&body), None).await?;
        self.decode(envelope)
    }

    fn decode<R: DeserializeOwned>(&self, envelope: Envelope) -> Response<R, RequestError> {
        envelope.into_data().map_err(|err| {
            let failure = match err {
                HttpError::Serialization(message) => Failure::Decode(message),
                other => Failure::Transport(other),
            };
            RequestError::new(self.adapter.kind(), failure)
        })
    }
}
