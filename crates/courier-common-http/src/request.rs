//! HTTP request types and header helpers.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Header map keyed by lower-case header name.
pub type HeaderMap = BTreeMap<String, String>;

/// Common HTTP header names (lower-case).
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether requests with this method may carry a payload.
    pub fn carries_body(&self) -> bool {
        matches!(
            self,
            Method::Post | Method::Put | Method::Patch | Method::Delete
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown method names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "HEAD" => Ok(Method::Head),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// An outbound request: method, URL, optional payload and headers.
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub payload: Option<Bytes>,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    /// Create a request without payload or headers.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            payload: None,
            headers: HeaderMap::new(),
        }
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Shorthand for a POST request with a payload.
    pub fn post(url: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self::new(Method::Post, url).payload(payload)
    }

    /// Attach a payload.
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Add a header; the name is lower-cased and trimmed.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(normalize_name(name.as_ref()), value.into());
        self
    }

    /// Add several headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(normalize_name(name.as_ref()), value.into());
        }
        self
    }

    /// Set the content type to JSON.
    pub fn json_content(self) -> Self {
        self.header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
    }

    /// Copy of this request pointing at another URL.
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self.clone()
        }
    }
}

/// Lower-case and trim a header name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Layer caller headers over defaults. Caller values win per key,
/// compared case-insensitively.
pub fn merge_headers(defaults: &HashMap<String, String>, caller: &HeaderMap) -> HeaderMap {
    let mut merged: HeaderMap = defaults
        .iter()
        .map(|(name, value)| (normalize_name(name), value.clone()))
        .collect();

    for (name, value) in caller {
        merged.insert(normalize_name(name), value.clone());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip_names() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" Post ".parse::<Method>().unwrap(), Method::Post);
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_carries_body() {
        assert!(Method::Post.carries_body());
        assert!(Method::Put.carries_body());
        assert!(!Method::Get.carries_body());
        assert!(!Method::Head.carries_body());
    }

    #[test]
    fn test_header_names_are_lower_cased() {
        let request = RequestDescriptor::get("http://example.com")
            .header("X-Trace-Id", "abc")
            .header(" Accept ", "text/html");

        assert_eq!(request.headers.get("x-trace-id"), Some(&"abc".to_string()));
        assert_eq!(request.headers.get("accept"), Some(&"text/html".to_string()));
        assert!(!request.headers.contains_key("X-Trace-Id"));
    }

    #[test]
    fn test_post_carries_payload() {
        let request = RequestDescriptor::post("http://example.com/form", "a=1").json_content();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.payload, Some(Bytes::from_static(b"a=1")));
        assert_eq!(
            request.headers.get(headers::CONTENT_TYPE),
            Some(&headers::CONTENT_TYPE_JSON.to_string())
        );
    }

    #[test]
    fn test_merge_headers_caller_wins() {
        let mut defaults = HashMap::new();
        defaults.insert("Accept".to_string(), "*/*".to_string());
        defaults.insert("user-agent".to_string(), "courier/0.1".to_string());

        let caller = RequestDescriptor::get("http://example.com")
            .header("ACCEPT", "application/json")
            .header("x-extra", "1")
            .headers;

        let merged = merge_headers(&defaults, &caller);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("accept"), Some(&"application/json".to_string()));
        assert_eq!(merged.get("user-agent"), Some(&"courier/0.1".to_string()));
        assert_eq!(merged.get("x-extra"), Some(&"1".to_string()));
    }

    #[test]
    fn test_with_url_keeps_everything_else() {
        let original = RequestDescriptor::post("http://a/x", "body").header("k", "v");
        let moved = original.with_url("http://b/y");
        assert_eq!(moved.url, "http://b/y");
        assert_eq!(moved.payload, original.payload);
        assert_eq!(moved.headers, original.headers);
    }
}
