//! Adapters: the uniform verb interface over a [`Transport`]
//!
//! Both adapter kinds share one implementation. The kind decides the error prefix, which
//! statuses count as success by default and whether per-call options are honoured:
//!
//! | kind    | accepted status | per-call options | error prefix  |
//! |---------|-----------------|------------------|---------------|
//! | `Fetch` | exactly 200     | merged           | `FetchError`  |
//! | `Axios` | any 2xx         | ignored          | `AxiosError`  |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::{Failure, HttpError, RequestError};
use crate::interceptor::{Interceptor, InterceptorHandle, Pipeline};
use crate::observer::ErrorObserver;
use crate::query::{append_query, QueryParams};
use crate::request::{
    get_header, insert_header, remove_header, CachePolicy, HttpRequest, Method, RequestMode,
    RequestOptions, APPLICATION_JSON, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE,
};
use crate::response::{Envelope, Response, TransportResponse};
use crate::transport::{default_transport, Transport};

/// Which client contract an adapter follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// fetch-style: strict status check, per-call options honoured
    #[default]
    Fetch,
    /// axios-style: trusts any 2xx, instance headers only
    Axios,
}

impl AdapterKind {
    /// Prefix of every error message produced by this kind
    pub fn error_prefix(&self) -> &'static str {
        match self {
            AdapterKind::Fetch => "FetchError",
            AdapterKind::Axios => "AxiosError",
        }
    }

    /// Status policy used unless the builder overrides it
    pub fn default_status_policy(&self) -> StatusPolicy {
        match self {
            AdapterKind::Fetch => StatusPolicy::OnlyOk,
            AdapterKind::Axios => StatusPolicy::AnySuccess,
        }
    }

    /// Whether per-call [`RequestOptions`] are merged over the instance defaults
    pub fn honors_call_options(&self) -> bool {
        matches!(self, AdapterKind::Fetch)
    }

    /// Whether an accepted response with an empty body decodes to `null`
    pub fn empty_body_is_null(&self) -> bool {
        matches!(self, AdapterKind::Axios)
    }

    fn default_options(&self) -> RequestOptions {
        match self {
            AdapterKind::Fetch => RequestOptions::new()
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .mode(RequestMode::Cors)
                .cache(CachePolicy::NoCache),
            AdapterKind::Axios => RequestOptions::new().header(CONTENT_TYPE, APPLICATION_JSON),
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterKind::Fetch => f.write_str("fetch"),
            AdapterKind::Axios => f.write_str("axios"),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fetch" => Ok(AdapterKind::Fetch),
            "axios" => Ok(AdapterKind::Axios),
            _ => Err(format!("Unknown adapter kind: {}", s)),
        }
    }
}

/// Which response statuses an adapter accepts as success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusPolicy {
    /// 200 only; 201 and 204 are rejected too
    OnlyOk,
    /// Any 2xx
    AnySuccess,
}

impl StatusPolicy {
    /// True when `status` counts as success
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusPolicy::OnlyOk => status == 200,
            StatusPolicy::AnySuccess => (200..300).contains(&status),
        }
    }
}

/// Uniform verb interface
///
/// `query` is appended to `url` when non-empty, `body` is sent as JSON text when present,
/// `options` are merged over the adapter defaults when the adapter honours them.
#[async_trait::async_trait]
pub trait HttpAdapter: Send + Sync + fmt::Debug {
    /// Contract this adapter follows
    fn kind(&self) -> AdapterKind;

    /// GET
    async fn get(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError>;

    /// DELETE
    async fn delete(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError>;

    /// PUT
    async fn put(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError>;

    /// PATCH
    async fn patch(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError>;

    /// POST
    async fn post(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError>;

    /// Set or replace the bearer token
    fn set_token(&mut self, _token: &str) {
        tracing::warn!("Adapter does not manage bearer tokens; set_token ignored");
    }

    /// Remove the bearer token
    fn clear_token(&mut self) {
        tracing::warn!("Adapter does not manage bearer tokens; clear_token ignored");
    }
}

/// Adapter binding the verb interface to one transport
pub struct Adapter {
    kind: AdapterKind,
    status_policy: StatusPolicy,
    transport: Arc<dyn Transport>,
    pipeline: Pipeline,
    defaults: RequestOptions,
    observer: Option<Arc<dyn ErrorObserver>>,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("kind", &self.kind)
            .field("status_policy", &self.status_policy)
            .field("transport", &self.transport)
            .field("interceptors", &self.pipeline.len())
            .field("defaults", &self.defaults)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Adapter {
    /// Builder for a fetch-style adapter
    pub fn fetch() -> AdapterBuilder {
        AdapterBuilder::new(AdapterKind::Fetch)
    }

    /// Builder for an axios-style adapter
    pub fn axios() -> AdapterBuilder {
        AdapterBuilder::new(AdapterKind::Axios)
    }

    /// Builder for an adapter of the given kind
    pub fn builder(kind: AdapterKind) -> AdapterBuilder {
        AdapterBuilder::new(kind)
    }

    /// Status policy in effect
    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// Instance defaults
    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Mutable instance defaults
    pub fn defaults_mut(&mut self) -> &mut RequestOptions {
        &mut self.defaults
    }

    /// Current bearer token, if any
    pub fn token(&self) -> Option<&str> {
        get_header(&self.defaults.headers, AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Replace the error observer
    pub fn set_error_observer(&mut self, observer: Option<Arc<dyn ErrorObserver>>) {
        self.observer = observer;
    }

    /// Interceptor pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Register an interceptor as the innermost layer
    pub fn register_interceptor<I: Interceptor + 'static>(
        &mut self,
        interceptor: I,
    ) -> InterceptorHandle {
        self.pipeline.register(interceptor)
    }

    /// Unregister an interceptor; with none left calls go straight to the transport
    pub fn unregister_interceptor(&mut self, handle: InterceptorHandle) -> bool {
        self.pipeline.unregister(handle)
    }

    /// Assemble the request for one call
    pub fn build_request(
        &self,
        method: Method,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<HttpRequest, RequestError> {
        let options = match options {
            Some(overrides) if self.kind.honors_call_options() => self.defaults.merged(overrides),
            Some(_) => {
                tracing::debug!("{} adapter ignores per-call options", self.kind);
                self.defaults.clone()
            }
            None => self.defaults.clone(),
        };

        let body = match body {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::to_string(value)
                    .map_err(|err| self.fail(Failure::Encode(err.to_string())))?,
            ),
        };

        let mut headers = options.headers;
        if body.is_some() && get_header(&headers, CONTENT_TYPE).is_none() {
            insert_header(&mut headers, CONTENT_TYPE, APPLICATION_JSON);
        }
        if let Some(directive) = options.cache.and_then(|cache| cache.header_value()) {
            if get_header(&headers, CACHE_CONTROL).is_none() {
                insert_header(&mut headers, CACHE_CONTROL, directive);
            }
        }

        Ok(HttpRequest {
            method,
            url: append_query(url, query),
            headers,
            body,
            mode: options.mode.unwrap_or_default(),
        })
    }

    /// Dispatch a prepared request and normalize the outcome
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, request: HttpRequest) -> Response<Envelope, RequestError> {
        tracing::debug!("Dispatching request");
        let response = self
            .pipeline
            .dispatch(&self.transport, request)
            .await
            .map_err(|err| self.fail(Failure::Transport(err)))?;

        self.settle(response).map_err(|failure| self.fail(failure))
    }

    async fn call(
        &self,
        method: Method,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        let request = self.build_request(method, url, query, body, options)?;
        self.execute(request).await
    }

    fn settle(&self, response: TransportResponse) -> Result<Envelope, Failure> {
        let status = response.status;
        let accepted = self.status_policy.accepts(status);

        if accepted && self.kind.empty_body_is_null() && is_blank(&response.body) {
            return Ok(Envelope {
                data: Value::Null,
                status,
            });
        }

        match serde_json::from_slice::<Value>(&response.body) {
            Ok(data) if accepted => Ok(Envelope { data, status }),
            Ok(data) => Err(Failure::Status(Envelope { data, status })),
            Err(err) if accepted => {
                tracing::warn!("Http Response error: {}", err);
                Err(Failure::Decode(err.to_string()))
            }
            Err(_) => {
                let data = if is_blank(&response.body) {
                    Value::Null
                } else {
                    Value::String(response.text())
                };
                Err(Failure::Status(Envelope { data, status }))
            }
        }
    }

    fn fail(&self, failure: Failure) -> RequestError {
        let error = RequestError::new(self.kind, failure);
        tracing::warn!("{}", error);
        if let Some(observer) = &self.observer {
            observer.on_error(&error);
        }
        error
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

#[async_trait::async_trait]
impl HttpAdapter for Adapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    async fn get(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.call(Method::Get, url, query, None, options).await
    }

    async fn delete(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.call(Method::Delete, url, query, body, options).await
    }

    async fn put(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.call(Method::Put, url, query, body, options).await
    }

    async fn patch(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.call(Method::Patch, url, query, body, options).await
    }

    async fn post(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        self.call(Method::Post, url, query, body, options).await
    }

    fn set_token(&mut self, token: &str) {
        insert_header(
            &mut self.defaults.headers,
            AUTHORIZATION,
            format!("Bearer {}", token),
        );
    }

    fn clear_token(&mut self) {
        remove_header(&mut self.defaults.headers, AUTHORIZATION);
    }
}

#[async_trait::async_trait]
impl<T: HttpAdapter + ?Sized> HttpAdapter for Box<T> {
    fn kind(&self) -> AdapterKind {
        (**self).kind()
    }

    async fn get(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        (**self).get(url, query, options).await
    }

    async fn delete(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        (**self).delete(url, query, body, options).await
    }

    async fn put(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        (**self).put(url, query, body, options).await
    }

    async fn patch(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        (**self).patch(url, query, body, options).await
    }

    async fn post(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response<Envelope, RequestError> {
        (**self).post(url, query, body, options).await
    }

    fn set_token(&mut self, token: &str) {
        (**self).set_token(token)
    }

    fn clear_token(&mut self) {
        (**self).clear_token()
    }
}

/// Builder for [`Adapter`]
pub struct AdapterBuilder {
    kind: AdapterKind,
    token: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    observer: Option<Arc<dyn ErrorObserver>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    status_policy: Option<StatusPolicy>,
    defaults: RequestOptions,
}

impl fmt::Debug for AdapterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterBuilder")
            .field("kind", &self.kind)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("transport", &self.transport)
            .field("observer", &self.observer.is_some())
            .field("interceptors", &self.interceptors.len())
            .field("status_policy", &self.status_policy)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl AdapterBuilder {
    /// Builder with the defaults of `kind`
    pub fn new(kind: AdapterKind) -> Self {
        Self {
            kind,
            token: None,
            transport: None,
            observer: None,
            interceptors: Vec::new(),
            status_policy: None,
            defaults: kind.default_options(),
        }
    }

    /// Bearer token sent as `Authorization: Bearer <token>`
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Transport to dispatch through instead of the default backend
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Shared transport to dispatch through instead of the default backend
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Global error observer
    pub fn error_observer<O: ErrorObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Interceptor registered on the built adapter, in call order
    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Override the kind's status policy
    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = Some(policy);
        self
    }

    /// Extra default header
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.defaults.headers, name, value);
        self
    }

    /// Default request mode
    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.defaults.mode = Some(mode);
        self
    }

    /// Default cache policy
    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.defaults.cache = Some(cache);
        self
    }

    /// Build the adapter
    ///
    /// Fails when no transport was injected and the crate has no backend enabled.
    pub fn build(self) -> Response<Adapter> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()
                .ok_or_else(|| HttpError::Build("no transport backend enabled".to_string()))?,
        };

        let mut pipeline = Pipeline::new();
        for interceptor in self.interceptors {
            pipeline.register_arc(interceptor);
        }

        let mut adapter = Adapter {
            kind: self.kind,
            status_policy: self
                .status_policy
                .unwrap_or_else(|| self.kind.default_status_policy()),
            transport,
            pipeline,
            defaults: self.defaults,
            observer: self.observer,
        };

        if let Some(token) = self.token {
            adapter.set_token(&token);
        }

        Ok(adapter)
    }
}
