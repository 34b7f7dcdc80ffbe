//! reqwest-based transport

use std::collections::BTreeMap;

use super::builder::TransportBuilder;
use crate::error::HttpError;
use crate::request::{HttpRequest, Method};
use crate::response::{Response, TransportResponse};
use crate::transport::Transport;

/// Transport backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Transport with default settings
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Builder for proxy, timeout and TLS settings
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// Wrap an existing `reqwest::Client`
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    pub(crate) fn from_builder(config: TransportBuilder) -> Response<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_config) = config.proxy {
            let proxy_url = proxy_config.url.to_string();
            let proxy = if let Some(matcher) = proxy_config.matcher {
                reqwest::Proxy::custom(move |url| {
                    if matcher.is_match(url.host_str().unwrap_or("")) {
                        Some(proxy_url.clone())
                    } else {
                        None
                    }
                })
            } else {
                reqwest::Proxy::all(&proxy_url).map_err(|e| HttpError::Proxy(e.to_string()))?
            };
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(HttpError::from)?;
        Ok(Self { inner: client })
    }
}

fn method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Response<TransportResponse> {
        let mut builder = self.inner.request(method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(HttpError::from)?;
        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response.bytes().await.map_err(HttpError::from)?;

        Ok(TransportResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_new() {
        let transport = ReqwestTransport::new();
        let _ = format!("{:?}", transport);
    }

    #[test]
    fn test_from_reqwest() {
        let transport = ReqwestTransport::from_reqwest(reqwest::Client::new());
        let _ = format!("{:?}", transport);
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(method(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(method(Method::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_error() {
        let transport = ReqwestTransport::new();
        let result = transport
            .send(HttpRequest::new(Method::Get, "http://127.0.0.1:1/unreachable"))
            .await;
        assert!(result.is_err());
    }
}
