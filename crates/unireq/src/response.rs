//! HTTP response types

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// HTTP Response type - generic over the body type R and error type E
pub type Response<R, E = HttpError> = Result<R, E>;

/// Success shape returned by every adapter verb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Parsed JSON body
    pub data: serde_json::Value,
    /// HTTP status code reported by the transport
    pub status: u16,
}

impl Envelope {
    /// Deserialize `data` into `T`
    pub fn into_data<T: DeserializeOwned>(self) -> Response<T> {
        serde_json::from_value(self.data).map_err(HttpError::from)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Raw response produced by a [`Transport`](crate::Transport)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lower-cased names
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Response with the given status and body and no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Response<T> {
        serde_json::from_slice(&self.body).map_err(HttpError::from)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_response_type_is_result() {
        let success: Response<i32> = Ok(42);
        assert!(matches!(success, Ok(42)));

        let error: Response<i32> = Err(HttpError::Timeout);
        assert!(matches!(error, Err(HttpError::Timeout)));
    }

    #[test]
    fn test_envelope_display_is_json() {
        let envelope = Envelope {
            data: json!([1, 2]),
            status: 500,
        };
        assert_eq!(envelope.to_string(), r#"{"data":[1,2],"status":500}"#);
    }

    #[test]
    fn test_envelope_into_data() {
        #[derive(Deserialize)]
        struct Item {
            id: u32,
        }

        let envelope = Envelope {
            data: json!({"id": 7}),
            status: 200,
        };
        let item: Item = envelope.into_data().expect("valid data");
        assert_eq!(item.id, 7);
    }

    #[test]
    fn test_transport_response_status_classes() {
        assert!(TransportResponse::new(204, "").is_success());
        assert!(TransportResponse::new(404, "").is_client_error());
        assert!(TransportResponse::new(503, "").is_server_error());
        assert!(!TransportResponse::new(302, "").is_success());
    }

    #[test]
    fn test_transport_response_header_lookup_ignores_case() {
        let mut response = TransportResponse::new(200, "{}");
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());

        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_transport_response_json() {
        let response = TransportResponse::new(200, r#"{"ok": true}"#);
        let value: serde_json::Value = response.json().expect("valid json");
        assert_eq!(value, json!({"ok": true}));
        assert!(response.json::<serde_json::Value>().is_ok());
        assert!(TransportResponse::new(200, "nope")
            .json::<serde_json::Value>()
            .is_err());
    }
}
