//! HTTP request descriptor and per-call options

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// Header carrying the bearer token
pub const AUTHORIZATION: &str = "Authorization";
/// Header carrying the body media type
pub const CONTENT_TYPE: &str = "Content-Type";
/// Header carrying the cache directive
pub const CACHE_CONTROL: &str = "Cache-Control";
/// Media type of every serialized body
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(HttpError::Other(format!("unsupported method: {other}"))),
        }
    }
}

/// Request mode, as understood by fetch-style transports
///
/// Native transports carry it for interceptors to inspect but do not act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Cross-origin requests allowed
    #[default]
    Cors,
    /// Opaque cross-origin requests
    NoCors,
    /// Same origin only
    SameOrigin,
}

/// Cache policy, mapped onto the `Cache-Control` request header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Leave caching to the transport
    Default,
    /// Revalidate with the server before using a cached response
    #[default]
    NoCache,
    /// Never store the response
    NoStore,
}

impl CachePolicy {
    /// Value for the `Cache-Control` header, `None` for [`CachePolicy::Default`]
    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            CachePolicy::Default => None,
            CachePolicy::NoCache => Some("no-cache"),
            CachePolicy::NoStore => Some("no-store"),
        }
    }
}

/// Header map with case-insensitive replacement
pub type Headers = BTreeMap<String, String>;

/// Insert a header, replacing any entry whose name differs only by case
pub fn insert_header(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    remove_header(headers, &name);
    headers.insert(name, value.into());
}

/// Remove every entry matching `name` case-insensitively
pub fn remove_header(headers: &mut Headers, name: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
}

/// Look up a header by case-insensitive name
pub fn get_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Transport options: instance defaults, or per-call overrides
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Headers
    #[serde(default)]
    pub headers: Headers,
    /// Request mode
    #[serde(default)]
    pub mode: Option<RequestMode>,
    /// Cache policy
    #[serde(default)]
    pub cache: Option<CachePolicy>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &redacted(&self.headers))
            .field("mode", &self.mode)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RequestOptions {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }

    /// Set the request mode
    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the cache policy
    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Layer `overrides` on top of `self`; the override wins per header and per field
    pub fn merged(&self, overrides: &RequestOptions) -> RequestOptions {
        let mut merged = self.clone();
        for (name, value) in &overrides.headers {
            insert_header(&mut merged.headers, name.as_str(), value.as_str());
        }
        if overrides.mode.is_some() {
            merged.mode = overrides.mode;
        }
        if overrides.cache.is_some() {
            merged.cache = overrides.cache;
        }
        merged
    }
}

/// One outgoing request, built fresh for every verb call
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP verb
    pub method: Method,
    /// Final URL including the query string
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Serialized JSON body
    pub body: Option<String>,
    /// Request mode
    pub mode: RequestMode,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &redacted(&self.headers))
            .field("body", &self.body.as_ref().map(|b| b.len()))
            .field("mode", &self.mode)
            .finish()
    }
}

impl HttpRequest {
    /// Request with no headers and no body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            mode: RequestMode::default(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }

    /// Set the body text
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(&self.headers, name)
    }
}

fn redacted(headers: &Headers) -> BTreeMap<&str, &str> {
    headers
        .iter()
        .map(|(key, value)| {
            if key.eq_ignore_ascii_case(AUTHORIZATION) {
                (key.as_str(), "<redacted>")
            } else {
                (key.as_str(), value.as_str())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip_through_str() {
        for method in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
        ] {
            assert_eq!(method.as_str().parse::<Method>().ok(), Some(method));
        }
        assert_eq!("patch".parse::<Method>().ok(), Some(Method::Patch));
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn test_insert_header_replaces_case_insensitively() {
        let mut headers = Headers::new();
        insert_header(&mut headers, "content-type", "text/plain");
        insert_header(&mut headers, CONTENT_TYPE, APPLICATION_JSON);

        assert_eq!(headers.len(), 1);
        assert_eq!(get_header(&headers, "CONTENT-TYPE"), Some(APPLICATION_JSON));
    }

    #[test]
    fn test_merged_prefers_overrides() {
        let defaults = RequestOptions::new()
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header("X-Trace", "a")
            .mode(RequestMode::Cors)
            .cache(CachePolicy::NoCache);
        let overrides = RequestOptions::new()
            .header("x-trace", "b")
            .cache(CachePolicy::NoStore);

        let merged = defaults.merged(&overrides);

        assert_eq!(get_header(&merged.headers, "X-Trace"), Some("b"));
        assert_eq!(get_header(&merged.headers, CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(merged.mode, Some(RequestMode::Cors));
        assert_eq!(merged.cache, Some(CachePolicy::NoStore));
        assert_eq!(merged.headers.len(), 2);
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let request = HttpRequest::new(Method::Get, "https://example.com")
            .with_header(AUTHORIZATION, "Bearer secret");
        let rendered = format!("{:?}", request);

        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_cache_policy_header_value() {
        assert_eq!(CachePolicy::Default.header_value(), None);
        assert_eq!(CachePolicy::NoCache.header_value(), Some("no-cache"));
        assert_eq!(CachePolicy::NoStore.header_value(), Some("no-store"));
    }
}
