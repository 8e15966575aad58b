//! HTTP response types and raw response parsing.

use crate::request::{headers, normalize_name, HeaderMap};
use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;

/// A normalized response.
///
/// Header names are always lower-case. `from_cache` is not part of the HTTP
/// response and is never persisted; it only tells the caller where the
/// value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    #[serde(skip)]
    from_cache: bool,
}

impl Response {
    /// Build a response. Header names are lower-cased and trimmed.
    pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (normalize_name(name.as_ref()), value.into()))
                .collect(),
            body: body.into(),
            from_cache: false,
        }
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// All headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Look up a header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&normalize_name(name)).map(String::as_str)
    }

    /// The `content-type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header(headers::CONTENT_TYPE)
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this response was served from the cache.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Mark as served from the cache.
    pub fn mark_cached(mut self) -> Self {
        self.from_cache = true;
        self
    }

    /// Check the response invariants: status in 100-599, lower-case header names.
    pub fn validate(&self) -> Result<(), ResponseError> {
        if !(100..=599).contains(&self.status) {
            return Err(ResponseError::InvalidStatus(self.status));
        }
        if let Some(name) = self.headers.keys().find(|k| **k != normalize_name(k)) {
            return Err(ResponseError::InvalidHeaderName(name.clone()));
        }
        Ok(())
    }
}

/// Response as produced by a transport: raw head lines and body bytes.
///
/// `lines` holds status and header lines in the order received. A transport
/// that follows redirects internally may emit several status lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub lines: Vec<String>,
    pub body: Bytes,
}

impl RawResponse {
    /// Build from one status line, header lines and a body.
    pub fn new<I, S>(status_line: impl Into<String>, header_lines: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines = vec![status_line.into()];
        lines.extend(header_lines.into_iter().map(Into::into));
        Self {
            lines,
            body: body.into(),
        }
    }

    /// Build from an already ordered list of head lines.
    pub fn from_lines<I, S>(lines: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            body: body.into(),
        }
    }
}

/// Response parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("transport response has no status line")]
    MissingStatusLine,

    #[error("status code {0} is outside 100-599")]
    InvalidStatus(u16),

    #[error("header name {0:?} is not lower-case")]
    InvalidHeaderName(String),
}

fn status_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^HTTP/\d+(?:\.\d+)?\s+(\d{3})(?:\s.*)?$").expect("status line pattern is valid")
    })
}

/// Extract the status code from a status line such as `HTTP/1.1 404 Not Found`.
pub fn parse_status_line(line: &str) -> Option<u16> {
    status_line_pattern()
        .captures(line.trim_end())
        .and_then(|cap| cap[1].parse().ok())
}

/// Split a header line on its first colon. Lines without a colon or with an
/// empty name yield `None`.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = normalize_name(name);
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim().to_string()))
}

/// Turn raw transport output into a [`Response`].
///
/// The first status line sets the status; later status lines are ignored.
/// Header lines seen before the first status line are dropped, and
/// duplicate header names keep the last value.
pub fn parse_response(raw: RawResponse) -> Result<Response, ResponseError> {
    let mut status: Option<u16> = None;
    let mut header_map = HeaderMap::new();

    for line in &raw.lines {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(code) = parse_status_line(line) {
            match status {
                None if (100..=599).contains(&code) => status = Some(code),
                None => return Err(ResponseError::InvalidStatus(code)),
                Some(first) => {
                    tracing::trace!(first, ignored = code, "ignoring additional status line");
                }
            }
            continue;
        }

        if status.is_none() {
            continue;
        }

        if let Some((name, value)) = parse_header_line(line) {
            header_map.insert(name, value);
        }
    }

    let status = status.ok_or(ResponseError::MissingStatusLine)?;

    Ok(Response {
        status,
        headers: header_map,
        body: raw.body,
        from_cache: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_line_variants() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(parse_status_line("HTTP/1.0 404 Not Found\r\n"), Some(404));
        assert_eq!(parse_status_line("HTTP/2 204"), Some(204));
        assert_eq!(parse_status_line("HTTP/1.1 2000 OK"), None);
        assert_eq!(parse_status_line("content-type: text/html"), None);
        assert_eq!(parse_status_line("HTTP/x 200 OK"), None);
    }

    #[test]
    fn test_header_line_split_on_first_colon() {
        assert_eq!(
            parse_header_line("Location: http://example.com:8080/x"),
            Some(("location".to_string(), "http://example.com:8080/x".to_string()))
        );
        assert_eq!(parse_header_line("no colon here"), None);
        assert_eq!(parse_header_line(": empty name"), None);
    }

    #[test]
    fn test_parse_response_basic() {
        let raw = RawResponse::new(
            "HTTP/1.1 200 OK",
            ["Content-Type: text/plain", "X-Count: 1", "X-Count: 2", "garbage"],
            "hello",
        );

        let response = parse_response(raw).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.header("x-count"), Some("2"));
        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.text(), "hello");
        assert!(!response.from_cache());
    }

    #[test]
    fn test_first_status_line_wins() {
        let raw = RawResponse::from_lines(
            [
                "HTTP/1.1 301 Moved Permanently",
                "Location: /next",
                "",
                "HTTP/1.1 200 OK",
                "Content-Type: text/html",
            ],
            "",
        );

        let response = parse_response(raw).unwrap();
        assert_eq!(response.status(), 301);
        assert_eq!(response.header("location"), Some("/next"));
        assert_eq!(response.content_type(), Some("text/html"));
    }

    #[test]
    fn test_headers_before_status_are_dropped() {
        let raw = RawResponse::from_lines(["X-Early: 1", "HTTP/1.1 200 OK", "X-Late: 2"], "");
        let response = parse_response(raw).unwrap();
        assert_eq!(response.header("x-early"), None);
        assert_eq!(response.header("x-late"), Some("2"));
    }

    #[test]
    fn test_missing_status_line() {
        let raw = RawResponse::from_lines(["Content-Type: text/html"], "body");
        assert!(matches!(
            parse_response(raw),
            Err(ResponseError::MissingStatusLine)
        ));
    }

    #[test]
    fn test_out_of_range_status() {
        let raw = RawResponse::new("HTTP/1.1 700 Nope", Vec::<String>::new(), "");
        assert!(matches!(
            parse_response(raw),
            Err(ResponseError::InvalidStatus(700))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(Response::new(200, [("X-A", "1")], "").validate().is_ok());
        assert!(matches!(
            Response::new(42, Vec::<(String, String)>::new(), "").validate(),
            Err(ResponseError::InvalidStatus(42))
        ));
    }

    #[test]
    fn test_cached_flag_not_serialized() {
        let response = Response::new(200, [("a", "b")], "x").mark_cached();
        let json = serde_json::to_vec(&response).unwrap();
        let back: Response = serde_json::from_slice(&json).unwrap();
        assert!(!back.from_cache());
        assert_eq!(back.status(), 200);
        assert_eq!(back.body(), response.body());
    }

    proptest! {
        #[test]
        fn header_names_always_lower_case(
            lines in prop::collection::vec("[A-Za-z-]{1,12}: [ -~]{0,20}", 0..8)
        ) {
            let raw = RawResponse::new("HTTP/1.1 200 OK", lines, "");
            let response = parse_response(raw).unwrap();
            for name in response.headers().keys() {
                prop_assert_eq!(name.clone(), name.to_ascii_lowercase());
            }
        }
    }
}
