//! Query string building
//!
//! Keys and values are form-url-encoded. List values repeat the key with a literal `[]`
//! suffix, so `{tag: ["a", "b"]}` becomes `tag[]=a&tag[]=b`.

use serde::Serialize;
use url::form_urlencoded;

const LIST_SUFFIX: &str = "[]";

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// `key=value`
    Single(String),
    /// `key[]=a&key[]=b`
    List(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for QueryValue {
    fn from(values: Vec<S>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Ordered query parameter mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`QueryParams::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Append one value to `key`, promoting a single value to a list
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, QueryValue::List(values))) => values.push(value),
            Some(entry) => {
                let previous = match &entry.1 {
                    QueryValue::Single(previous) => previous.clone(),
                    QueryValue::List(_) => String::new(),
                };
                entry.1 = QueryValue::List(vec![previous, value]);
            }
            None => self.entries.push((key, QueryValue::Single(value))),
        }
    }

    /// Value for `key`
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// True when there are no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate keys and values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build from any serializable value
    ///
    /// Only a top-level object yields parameters. Scalars are stringified, arrays become
    /// lists, `null` becomes an empty value and nested objects are skipped. Anything else
    /// yields an empty mapping.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => map
                .into_iter()
                .filter_map(|(key, value)| match value {
                    serde_json::Value::Array(items) => Some((
                        key,
                        QueryValue::List(items.iter().filter_map(scalar_to_string).collect()),
                    )),
                    other => scalar_to_string(&other).map(|s| (key, QueryValue::Single(s))),
                })
                .collect(),
            Ok(_) => Self::new(),
            Err(err) => {
                tracing::debug!("Query parameters are not serializable: {}", err);
                Self::new()
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => Some(String::new()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

fn encode(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes()).collect()
}

/// Serialize `params` into a query string without the leading `?`
///
/// An empty list contributes no pairs, so it does not survive [`parse_query`].
pub fn build_query_string(params: &QueryParams) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params.iter() {
        let key = encode(key);
        match value {
            QueryValue::Single(value) => pairs.push(format!("{}={}", key, encode(value))),
            QueryValue::List(values) => {
                for value in values {
                    pairs.push(format!("{}{}={}", key, LIST_SUFFIX, encode(value)));
                }
            }
        }
    }
    pairs.join("&")
}

/// Append the query string of `params` to `url`
///
/// The query goes before any `#fragment`. It is joined with `?`, or with `&` when `url`
/// already has a non-empty query. An absent or empty mapping leaves `url` untouched.
pub fn append_query(url: &str, params: Option<&QueryParams>) -> String {
    let query = params.map(build_query_string).unwrap_or_default();
    if query.is_empty() {
        return url.to_string();
    }

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.ends_with('?') || base.ends_with('&') {
        ""
    } else if base.contains('?') {
        "&"
    } else {
        "?"
    };

    match fragment {
        Some(fragment) => format!("{base}{separator}{query}#{fragment}"),
        None => format!("{base}{separator}{query}"),
    }
}

/// Decode a query string (with or without a leading `?`)
///
/// Keys whose encoded form ends in a literal `[]` are collected into list values under
/// the bare key. An escaped `%5B%5D` belongs to the key itself.
pub fn parse_query(query: &str) -> QueryParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = QueryParams::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let raw_key = pair.split_once('=').map_or(pair, |(key, _)| key);
        let is_list = raw_key.ends_with(LIST_SUFFIX);

        let Some((key, value)) = form_urlencoded::parse(pair.as_bytes()).next() else {
            continue;
        };
        let value = value.into_owned();

        if is_list {
            let bare = &key[..key.len() - LIST_SUFFIX.len()];
            match params.entries.iter_mut().find(|(k, _)| k == bare) {
                Some((_, QueryValue::List(values))) => values.push(value),
                _ => params.insert(bare, QueryValue::List(vec![value])),
            }
        } else {
            params.insert(key.into_owned(), value);
        }
    }
    params
}
