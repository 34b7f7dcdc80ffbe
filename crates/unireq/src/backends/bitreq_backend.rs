//! bitreq-based transport

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitreq::RequestExt;

use super::builder::{ProxyConfig, TransportBuilder};
use crate::error::HttpError;
use crate::request::{HttpRequest, Method};
use crate::response::{Response, TransportResponse};
use crate::transport::Transport;

/// Transport backed by a pooled `bitreq::Client`
#[derive(Clone)]
pub struct BitreqTransport {
    client: Arc<bitreq::Client>,
    proxy: Option<(ProxyConfig, bitreq::Proxy)>,
    timeout: Option<Duration>,
}

impl fmt::Debug for BitreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitreqTransport")
            .field("proxy", &self.proxy.as_ref().map(|(config, _)| &config.url))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for BitreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BitreqTransport {
    /// Transport with default settings
    pub fn new() -> Self {
        install_crypto_provider();

        Self {
            client: Arc::new(bitreq::Client::new(10)),
            proxy: None,
            timeout: None,
        }
    }

    /// Builder for proxy, timeout and TLS settings
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    pub(crate) fn from_builder(config: TransportBuilder) -> Response<Self> {
        if config.accept_invalid_certs {
            tracing::warn!("bitreq transport does not support accepting invalid certificates");
        }

        let proxy = match config.proxy {
            Some(proxy_config) => {
                let proxy = bitreq::Proxy::new_http(proxy_address(&proxy_config.url)?)
                    .map_err(|e| HttpError::Proxy(e.to_string()))?;
                Some((proxy_config, proxy))
            }
            None => None,
        };

        Ok(Self {
            proxy,
            timeout: config.timeout,
            ..Self::new()
        })
    }

    fn prepare(&self, request: HttpRequest) -> Response<bitreq::Request> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| HttpError::Other(format!("Invalid URL {}: {}", request.url, e)))?;

        let mut req = match request.method {
            Method::Get => bitreq::get(url),
            Method::Post => bitreq::post(url),
            Method::Put => bitreq::put(url),
            Method::Patch => bitreq::patch(url),
            Method::Delete => bitreq::delete(url),
        };

        for (name, value) in &request.headers {
            req = req.with_header(name.as_str(), value.as_str());
        }

        if let Some(timeout) = self.timeout {
            let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
            req = req.with_timeout(secs.max(1));
        }

        if let Some((config, proxy)) = &self.proxy {
            if config.applies_to(&request.url) {
                req = req.with_proxy(proxy.clone());
            }
        }

        Ok(match request.body {
            Some(body) => req.with_body(body),
            None => req,
        })
    }
}

/// `[user[:password]@]host:port` as bitreq expects it; a `Url` would print a trailing `/`
fn proxy_address(url: &url::Url) -> Response<String> {
    let host = url
        .host_str()
        .ok_or_else(|| HttpError::Proxy(format!("Proxy URL {} has no host", url)))?;
    let port = url.port_or_known_default().unwrap_or(8080);

    let credentials = match (url.username(), url.password()) {
        ("", _) => String::new(),
        (user, Some(password)) => format!("{}:{}@", user, password),
        (user, None) => format!("{}@", user),
    };

    Ok(format!("{}{}:{}", credentials, host, port))
}

fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

#[async_trait::async_trait]
impl Transport for BitreqTransport {
    async fn send(&self, request: HttpRequest) -> Response<TransportResponse> {
        let response = self
            .prepare(request)?
            .send_async_with_client(&self.client)
            .await
            .map_err(HttpError::from)?;

        let headers = response
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect::<BTreeMap<_, _>>();

        Ok(TransportResponse {
            status: response.status_code as u16,
            headers,
            body: response.as_bytes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_client() {
        let transport = BitreqTransport::new();
        let debug = format!("{:?}", transport);
        assert!(debug.contains("BitreqTransport"));
    }

    #[test]
    fn test_prepare_rejects_relative_url() {
        let transport = BitreqTransport::new();
        let result = transport.prepare(HttpRequest::new(Method::Get, "/items"));
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[test]
    fn test_from_builder_with_proxy() {
        let proxy = url::Url::parse("http://localhost:8080").expect("Valid proxy URL");
        let transport = TransportBuilder::default()
            .proxy(proxy)
            .timeout(Duration::from_secs(3))
            .build_bitreq()
            .expect("bitreq transport builds");

        assert!(transport.proxy.is_some());
        assert_eq!(transport.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_proxy_address_drops_path() {
        let url = url::Url::parse("http://localhost:8080/").expect("Valid proxy URL");
        assert_eq!(proxy_address(&url).expect("address"), "localhost:8080");

        let url = url::Url::parse("http://proxy.test").expect("Valid proxy URL");
        assert_eq!(proxy_address(&url).expect("address"), "proxy.test:80");

        let url = url::Url::parse("http://me:pw@proxy.test:3128").expect("Valid proxy URL");
        assert_eq!(proxy_address(&url).expect("address"), "me:pw@proxy.test:3128");
    }

    #[test]
    fn test_proxy_address_requires_host() {
        let url = url::Url::parse("unix:/run/proxy.sock").expect("Valid URL");
        assert!(matches!(proxy_address(&url), Err(HttpError::Proxy(_))));
    }
}
