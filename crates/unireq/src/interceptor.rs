//! Request/response interceptors
//!
//! An [`Interceptor`] observes or rewrites a call at four fixed points. Interceptors are
//! stacked in a [`Pipeline`]: request hooks run in registration order, response and error
//! hooks run in reverse, so the first interceptor registered is the outermost layer.
//!
//! ```text
//! on_request (1) -> on_request (2) -> transport
//!                                        |
//! on_response (1) <- on_response (2) <---+
//! ```
//!
//! A failed dispatch goes to `on_request_error`, which may recover with a response. A
//! failure raised by a response hook goes to `on_response_error`. A failure raised by a
//! request hook skips dispatch and unwinds from that layer outwards.

use std::fmt;
use std::sync::Arc;

use crate::error::HttpError;
use crate::request::HttpRequest;
use crate::response::{Response, TransportResponse};
use crate::transport::Transport;

/// Hooks run around a transport call
///
/// Every hook has a pass-through default.
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// Runs before dispatch; may rewrite the request or reject it
    fn on_request(&self, request: HttpRequest) -> Response<HttpRequest> {
        Ok(request)
    }

    /// Runs when dispatch (or an inner request hook) failed; may recover with a response
    fn on_request_error(&self, error: HttpError) -> Response<TransportResponse> {
        Err(error)
    }

    /// Runs after a response was received; may rewrite it or turn it into an error
    fn on_response(&self, response: TransportResponse) -> Response<TransportResponse> {
        Ok(response)
    }

    /// Runs when a response hook failed
    fn on_response_error(&self, error: HttpError) -> Response<TransportResponse> {
        Err(error)
    }
}

type RequestHook = Arc<dyn Fn(HttpRequest) -> Response<HttpRequest> + Send + Sync>;
type ErrorHook = Arc<dyn Fn(HttpError) -> Response<TransportResponse> + Send + Sync>;
type ResponseHook = Arc<dyn Fn(TransportResponse) -> Response<TransportResponse> + Send + Sync>;

/// Interceptor assembled from up to four closures
#[derive(Clone, Default)]
pub struct InterceptorSet {
    request: Option<RequestHook>,
    request_error: Option<ErrorHook>,
    response: Option<ResponseHook>,
    response_error: Option<ErrorHook>,
}

impl fmt::Debug for InterceptorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorSet")
            .field("request", &self.request.is_some())
            .field("request_error", &self.request_error.is_some())
            .field("response", &self.response.is_some())
            .field("response_error", &self.response_error.is_some())
            .finish()
    }
}

impl InterceptorSet {
    /// Set with no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the request callback
    pub fn set_request<F>(&mut self, hook: F)
    where
        F: Fn(HttpRequest) -> Response<HttpRequest> + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(hook));
    }

    /// Replace the request-error callback
    pub fn set_request_error<F>(&mut self, hook: F)
    where
        F: Fn(HttpError) -> Response<TransportResponse> + Send + Sync + 'static,
    {
        self.request_error = Some(Arc::new(hook));
    }

    /// Replace the response callback
    pub fn set_response<F>(&mut self, hook: F)
    where
        F: Fn(TransportResponse) -> Response<TransportResponse> + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(hook));
    }

    /// Replace the response-error callback
    pub fn set_response_error<F>(&mut self, hook: F)
    where
        F: Fn(HttpError) -> Response<TransportResponse> + Send + Sync + 'static,
    {
        self.response_error = Some(Arc::new(hook));
    }

    /// Builder form of [`InterceptorSet::set_request`]
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(HttpRequest) -> Response<HttpRequest> + Send + Sync + 'static,
    {
        self.set_request(hook);
        self
    }

    /// Builder form of [`InterceptorSet::set_request_error`]
    pub fn on_request_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(HttpError) -> Response<TransportResponse> + Send + Sync + 'static,
    {
        self.set_request_error(hook);
        self
    }

    /// Builder form of [`InterceptorSet::set_response`]
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(TransportResponse) -> Response<TransportResponse> + Send + Sync + 'static,
    {
        self.set_response(hook);
        self
    }

    /// Builder form of [`InterceptorSet::set_response_error`]
    pub fn on_response_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(HttpError) -> Response<TransportResponse> + Send + Sync + 'static,
    {
        self.set_response_error(hook);
        self
    }
}

impl Interceptor for InterceptorSet {
    fn on_request(&self, request: HttpRequest) -> Response<HttpRequest> {
        match &self.request {
            Some(hook) => hook(request),
            None => Ok(request),
        }
    }

    fn on_request_error(&self, error: HttpError) -> Response<TransportResponse> {
        match &self.request_error {
            Some(hook) => hook(error),
            None => Err(error),
        }
    }

    fn on_response(&self, response: TransportResponse) -> Response<TransportResponse> {
        match &self.response {
            Some(hook) => hook(response),
            None => Ok(response),
        }
    }

    fn on_response_error(&self, error: HttpError) -> Response<TransportResponse> {
        match &self.response_error {
            Some(hook) => hook(error),
            None => Err(error),
        }
    }
}

/// Interceptor that logs every call through `tracing` (no headers or bodies)
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn on_request(&self, request: HttpRequest) -> Response<HttpRequest> {
        tracing::debug!(target: "unireq::http", method = %request.method, url = %request.url, "sending request");
        Ok(request)
    }

    fn on_request_error(&self, error: HttpError) -> Response<TransportResponse> {
        tracing::debug!(target: "unireq::http", err = %error, "request error");
        Err(error)
    }

    fn on_response(&self, response: TransportResponse) -> Response<TransportResponse> {
        tracing::debug!(target: "unireq::http", status = response.status, bytes = response.body.len(), "response received");
        Ok(response)
    }

    fn on_response_error(&self, error: HttpError) -> Response<TransportResponse> {
        tracing::debug!(target: "unireq::http", err = %error, "response error");
        Err(error)
    }
}

/// Token returned by [`Pipeline::register`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Request,
    Response,
}

/// Ordered interceptor stack
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    layers: Vec<(InterceptorHandle, Arc<dyn Interceptor>)>,
    next_id: u64,
}

impl Pipeline {
    /// Empty pipeline; dispatches straight to the transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interceptor as the innermost layer
    pub fn register<I: Interceptor + 'static>(&mut self, interceptor: I) -> InterceptorHandle {
        self.register_arc(Arc::new(interceptor))
    }

    /// Add a shared interceptor as the innermost layer
    pub fn register_arc(&mut self, interceptor: Arc<dyn Interceptor>) -> InterceptorHandle {
        let handle = InterceptorHandle(self.next_id);
        self.next_id += 1;
        self.layers.push((handle, interceptor));
        handle
    }

    /// Remove the interceptor registered under `handle`
    ///
    /// Returns `false` when the handle is unknown or was already removed.
    pub fn unregister(&mut self, handle: InterceptorHandle) -> bool {
        let before = self.layers.len();
        self.layers.retain(|(h, _)| *h != handle);
        before != self.layers.len()
    }

    /// Remove every interceptor
    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Number of registered interceptors
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when no interceptor is registered
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run `request` through every layer and `transport`
    pub async fn dispatch<T>(
        &self,
        transport: &T,
        request: HttpRequest,
    ) -> Response<TransportResponse>
    where
        T: Transport + ?Sized,
    {
        if self.layers.is_empty() {
            return transport.send(request).await;
        }

        let mut current = Ok(request);
        let mut entered = 0;
        for (_, layer) in &self.layers {
            if current.is_err() {
                break;
            }
            entered += 1;
            current = current.and_then(|request| layer.on_request(request));
        }

        let mut outcome = match current {
            Ok(request) => transport.send(request).await,
            Err(err) => {
                tracing::trace!("Request rejected by interceptor: {}", err);
                Err(err)
            }
        };
        let mut stage = if outcome.is_ok() {
            Stage::Response
        } else {
            Stage::Request
        };

        for (_, layer) in self.layers[..entered].iter().rev() {
            outcome = match outcome {
                Ok(response) => layer
                    .on_response(response)
                    .or_else(|err| layer.on_response_error(err)),
                Err(err) if stage == Stage::Request => layer.on_request_error(err),
                Err(err) => layer.on_response_error(err),
            };
            if outcome.is_ok() {
                stage = Stage::Response;
            }
        }

        outcome
    }
}

/// A transport wrapped by a pipeline
///
/// Behaves as a [`Transport`]; [`Intercepted::into_inner`] hands back the original one.
#[derive(Debug, Clone)]
pub struct Intercepted<T> {
    inner: T,
    pipeline: Pipeline,
}

impl<T: Transport> Intercepted<T> {
    /// Wrap `inner` with `pipeline`
    pub fn new(inner: T, pipeline: Pipeline) -> Self {
        Self { inner, pipeline }
    }

    /// Mutable access to the pipeline
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Drop the pipeline and return the unwrapped transport
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait::async_trait]
impl<T: Transport> Transport for Intercepted<T> {
    async fn send(&self, request: HttpRequest) -> Response<TransportResponse> {
        self.pipeline.dispatch(&self.inner, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::request::Method;

    #[derive(Debug, Default)]
    struct Echo {
        fail: bool,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait::async_trait]
    impl Transport for Echo {
        async fn send(&self, request: HttpRequest) -> Response<TransportResponse> {
            let url = request.url.clone();
            self.seen.lock().expect("lock").push(request);
            if self.fail {
                Err(HttpError::Connection("refused".to_string()))
            } else {
                Ok(TransportResponse::new(200, url))
            }
        }
    }

    #[derive(Debug)]
    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    impl Interceptor for Tag {
        fn on_request(&self, request: HttpRequest) -> Response<HttpRequest> {
            self.1.lock().expect("lock").push(format!("req:{}", self.0));
            Ok(request)
        }

        fn on_response(&self, response: TransportResponse) -> Response<TransportResponse> {
            self.1.lock().expect("lock").push(format!("resp:{}", self.0));
            Ok(response)
        }
    }

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, url)
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_transparent() {
        let transport = Echo::default();
        let response = Pipeline::new()
            .dispatch(&transport, get("https://a.test"))
            .await
            .expect("dispatch");
        assert_eq!(response, TransportResponse::new(200, "https://a.test"));
    }

    #[tokio::test]
    async fn test_layers_run_as_onion() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.register(Tag("outer", log.clone()));
        pipeline.register(Tag("inner", log.clone()));

        pipeline
            .dispatch(&Echo::default(), get("https://a.test"))
            .await
            .expect("dispatch");

        assert_eq!(
            *log.lock().expect("lock"),
            vec!["req:outer", "req:inner", "resp:inner", "resp:outer"]
        );
    }

    #[tokio::test]
    async fn test_request_hook_rewrites_request() {
        let transport = Echo::default();
        let mut pipeline = Pipeline::new();
        pipeline.register(
            InterceptorSet::new().on_request(|request| Ok(request.with_header("X-Trace", "1"))),
        );

        pipeline
            .dispatch(&transport, get("https://a.test"))
            .await
            .expect("dispatch");

        let seen = transport.seen.lock().expect("lock");
        assert_eq!(seen[0].header("x-trace"), Some("1"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_without_request_error_hook() {
        let transport = Echo {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new();
        pipeline.register(InterceptorSet::new());

        let result = pipeline.dispatch(&transport, get("https://a.test")).await;
        assert!(matches!(result, Err(HttpError::Connection(_))));
    }

    #[tokio::test]
    async fn test_request_error_hook_replaces_failure() {
        let transport = Echo {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new();
        pipeline.register(
            InterceptorSet::new()
                .on_request_error(|_| Ok(TransportResponse::new(200, r#"{"cached":true}"#))),
        );

        let response = pipeline
            .dispatch(&transport, get("https://a.test"))
            .await
            .expect("recovered");
        assert_eq!(response.body, br#"{"cached":true}"#.to_vec());
    }

    #[tokio::test]
    async fn test_response_error_hook_sees_response_hook_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let mut pipeline = Pipeline::new();
        pipeline.register(
            InterceptorSet::new()
                .on_response(|_| Err(HttpError::Other("bad response".to_string())))
                .on_request_error(|err| Err(err))
                .on_response_error(move |err| {
                    seen.lock().expect("lock").push(err.to_string());
                    Err(HttpError::Other("wrapped".to_string()))
                }),
        );

        let result = pipeline
            .dispatch(&Echo::default(), get("https://a.test"))
            .await;

        assert!(matches!(result, Err(HttpError::Other(msg)) if msg == "wrapped"));
        assert_eq!(*calls.lock().expect("lock"), vec!["bad response".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_request_skips_dispatch() {
        let transport = Echo::default();
        let mut pipeline = Pipeline::new();
        pipeline.register(
            InterceptorSet::new().on_request(|_| Err(HttpError::Other("blocked".to_string()))),
        );

        let result = pipeline.dispatch(&transport, get("https://a.test")).await;

        assert!(matches!(result, Err(HttpError::Other(msg)) if msg == "blocked"));
        assert!(transport.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_inner_response_failure_reaches_outer_response_error_hook() {
        let outer_calls = Arc::new(Mutex::new(0));
        let counter = outer_calls.clone();
        let mut pipeline = Pipeline::new();
        pipeline.register(
            InterceptorSet::new()
                .on_request_error(|_| panic!("request error hook must not run"))
                .on_response_error(move |err| {
                    *counter.lock().expect("lock") += 1;
                    Err(err)
                }),
        );
        pipeline.register(
            InterceptorSet::new().on_response(|_| Err(HttpError::Other("inner".to_string()))),
        );

        let result = pipeline
            .dispatch(&Echo::default(), get("https://a.test"))
            .await;

        assert!(result.is_err());
        assert_eq!(*outer_calls.lock().expect("lock"), 1);
    }

    #[tokio::test]
    async fn test_unregister_restores_plain_transport() {
        let mut pipeline = Pipeline::new();
        let handle = pipeline.register(
            InterceptorSet::new()
                .on_response(|_| Ok(TransportResponse::new(418, "teapot"))),
        );

        let wrapped = pipeline
            .dispatch(&Echo::default(), get("https://a.test"))
            .await
            .expect("dispatch");
        assert_eq!(wrapped.status, 418);

        assert!(pipeline.unregister(handle));
        assert!(!pipeline.unregister(handle));
        assert!(pipeline.is_empty());

        let plain = Echo::default().send(get("https://a.test")).await;
        let unwrapped = pipeline.dispatch(&Echo::default(), get("https://a.test")).await;
        assert_eq!(plain.expect("plain"), unwrapped.expect("unwrapped"));
    }

    #[tokio::test]
    async fn test_intercepted_into_inner() {
        let mut pipeline = Pipeline::new();
        pipeline.register(
            InterceptorSet::new().on_request(|_| Err(HttpError::Other("nope".to_string()))),
        );
        let wrapped = Intercepted::new(Echo::default(), pipeline);
        assert!(wrapped.send(get("https://a.test")).await.is_err());

        let inner = wrapped.into_inner();
        assert!(inner.send(get("https://a.test")).await.is_ok());
    }
}
