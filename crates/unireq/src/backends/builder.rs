//! Transport builder shared by the backends

use std::time::Duration;

use crate::error::HttpError;
use crate::response::Response;

/// Proxy target, optionally restricted to hosts matching a pattern
#[derive(Debug, Clone)]
pub(crate) struct ProxyConfig {
    pub(crate) url: url::Url,
    pub(crate) matcher: Option<regex::Regex>,
}

impl ProxyConfig {
    /// True when requests to `url` should go through the proxy
    pub(crate) fn applies_to(&self, url: &str) -> bool {
        match &self.matcher {
            None => true,
            Some(matcher) => url::Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.host_str().map(|host| matcher.is_match(host)))
                .unwrap_or(false),
        }
    }
}

/// Builder for configuring proxy, timeout and TLS settings of a transport
#[derive(Debug, Default, Clone)]
pub struct TransportBuilder {
    pub(crate) accept_invalid_certs: bool,
    pub(crate) proxy: Option<ProxyConfig>,
    pub(crate) timeout: Option<Duration>,
}

impl TransportBuilder {
    /// Accept invalid TLS certificates
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Send every request through a proxy
    pub fn proxy(mut self, url: url::Url) -> Self {
        self.proxy = Some(ProxyConfig { url, matcher: None });
        self
    }

    /// Send requests whose host matches `pattern` through a proxy
    pub fn proxy_with_matcher(mut self, url: url::Url, pattern: &str) -> Response<Self> {
        let matcher = regex::Regex::new(pattern)
            .map_err(|e| HttpError::Proxy(format!("Invalid proxy pattern: {}", e)))?;
        self.proxy = Some(ProxyConfig {
            url,
            matcher: Some(matcher),
        });
        Ok(self)
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a reqwest transport
    #[cfg(feature = "reqwest")]
    pub fn build_reqwest(self) -> Response<super::ReqwestTransport> {
        super::ReqwestTransport::from_builder(self)
    }

    /// Build a bitreq transport
    #[cfg(feature = "bitreq")]
    pub fn build_bitreq(self) -> Response<super::BitreqTransport> {
        super::BitreqTransport::from_builder(self)
    }
}
