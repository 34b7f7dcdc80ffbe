//! Uniform HTTP calls over pluggable transports
//!
//! An [`Adapter`] turns `get`/`post`/`put`/`patch`/`delete` calls into [`HttpRequest`]s,
//! runs them through its interceptor [`Pipeline`] and a [`Transport`], and hands back an
//! [`Envelope`] carrying the decoded JSON body and the status code. Two adapter kinds
//! ship with the crate: [`AdapterKind::Fetch`] and [`AdapterKind::Axios`]. The
//! [`Request`] facade wraps either one behind a single call surface.
//!
//! # Example
//!
//! ```no_run
//! use unireq::{Adapter, QueryParams, Request, RequestError};
//!
//! async fn example() -> Result<(), RequestError> {
//!     let adapter = Adapter::fetch()
//!         .token("secret")
//!         .build()
//!         .expect("a backend is enabled");
//!     let request = Request::new(adapter);
//!
//!     let query = QueryParams::new().with("tag", vec!["a", "b"]);
//!     let envelope = request
//!         .get("https://api.example.com/items", Some(&query), None)
//!         .await?;
//!     println!("{} {}", envelope.status, envelope.data);
//!     Ok(())
//! }
//! ```

mod adapter;
mod backends;
mod error;
mod facade;
mod interceptor;
mod observer;
mod query;
mod request;
mod response;
mod transport;

pub use adapter::{Adapter, AdapterBuilder, AdapterKind, HttpAdapter, StatusPolicy};
#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
pub use backends::BitreqTransport;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub use backends::ReqwestTransport;
pub use backends::TransportBuilder;
pub use error::{Failure, HttpError, RequestError};
pub use facade::Request;
pub use interceptor::{
    Intercepted, Interceptor, InterceptorHandle, InterceptorSet, LoggingInterceptor, Pipeline,
};
pub use observer::{ErrorObserver, TracingObserver};
pub use query::{append_query, build_query_string, parse_query, QueryParams, QueryValue};
pub use request::{
    CachePolicy, Headers, HttpRequest, Method, RequestMode, RequestOptions, APPLICATION_JSON,
    AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE,
};
pub use request::{get_header, insert_header, remove_header};
pub use response::{Envelope, Response, TransportResponse};
pub use transport::{default_transport, Transport};

/// GET `url` with a default fetch adapter, deserializing the body into `R`
pub async fn fetch<R>(url: &str) -> Response<R, RequestError>
where
    R: serde::de::DeserializeOwned,
{
    let adapter = Adapter::fetch()
        .build()
        .map_err(|err| RequestError::new(AdapterKind::Fetch, err))?;
    Request::new(adapter).get_json(url, None).await
}
