//! HTTP request and response types shared by the sequencer and transports.
//!
//! # Design
//! Requests are plain data built by the sequencer and handed to a
//! `Transport`. Responses carry their status and headers eagerly but keep
//! the body behind a `ResponseBody`, a deferred read that runs on first
//! access. A transport can therefore report a good status line while the
//! body stream still fails later, and that failure reaches whoever reads the
//! body rather than whoever sent the request.
//!
//! Header names in responses are lower-cased and map to every value the
//! server sent, in order.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is either relative (resolved by the transport against its base
/// URL) or an absolute `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Headers as they go on the wire: the request headers followed by a
    /// `Content-Length` for the body, unless one was set explicitly.
    pub fn headers_with_content_length(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        let has_length = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-length"));
        if let (Some(body), false) = (&self.body, has_length) {
            headers.push(("Content-Length".to_string(), body.len().to_string()));
        }
        headers
    }
}

/// Resolve a request path against a base URL.
///
/// Absolute URLs pass through untouched; relative paths are joined with a
/// single `/`.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

type BodyLoader = Box<dyn FnOnce() -> Result<Vec<u8>, HttpError> + Send>;

/// A response body that is read on first access.
///
/// The loader runs at most once. Its outcome, bytes or failure, is kept and
/// returned by every later read.
pub struct ResponseBody {
    loader: Option<BodyLoader>,
    outcome: Result<Vec<u8>, HttpError>,
}

impl ResponseBody {
    pub fn ready(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            loader: None,
            outcome: Ok(bytes.into()),
        }
    }

    pub fn deferred<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Vec<u8>, HttpError> + Send + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            outcome: Ok(Vec::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loader.is_none()
    }

    pub fn read(&mut self) -> Result<&[u8], HttpError> {
        if let Some(load) = self.loader.take() {
            self.outcome = load();
        }
        self.outcome.as_deref().map_err(Clone::clone)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.loader, &self.outcome) {
            (Some(_), _) => f.write_str("ResponseBody(<deferred>)"),
            (None, Ok(bytes)) => write!(f, "ResponseBody({} bytes)", bytes.len()),
            (None, Err(err)) => write!(f, "ResponseBody(<failed: {err}>)"),
        }
    }
}

/// An HTTP response with eager status and headers and a lazy body.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub headers: BTreeMap<String, Vec<String>>,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, url: impl Into<String>, body: ResponseBody) -> Self {
        Self {
            status,
            url: url.into(),
            headers: BTreeMap::new(),
            body,
        }
    }

    /// Append a header value; names are stored lower-cased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn content(&mut self) -> Result<&[u8], HttpError> {
        self.body.read()
    }

    pub fn text(&mut self) -> Result<String, HttpError> {
        let bytes = self.body.read()?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, HttpError> {
        let bytes = self.body.read()?;
        serde_json::from_slice(bytes).map_err(|e| HttpError::Deserialization(e.to_string()))
    }

    /// Map 3xx and 4xx statuses to `Redirection` and `Client`, and anything
    /// from 500 up (including non-standard 6xx+) to `Server`. Statuses below
    /// 300 pass through. The body is not touched.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        let status = self.status;
        match status {
            300..=399 => Err(HttpError::Redirection { status, url: self.url }),
            400..=499 => Err(HttpError::Client { status, url: self.url }),
            500.. => Err(HttpError::Server { status, url: self.url }),
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn content_length_is_appended_for_bodies() {
        let req = HttpRequest::post("url2")
            .with_header("Accept", "application/txt")
            .with_body(r#"{"foo":"bar"}"#);
        assert_eq!(
            req.headers_with_content_length(),
            vec![
                ("Accept".to_string(), "application/txt".to_string()),
                ("Content-Length".to_string(), "13".to_string()),
            ]
        );
    }

    #[test]
    fn content_length_is_not_duplicated_or_invented() {
        let req = HttpRequest::post("url2")
            .with_header("content-length", "4")
            .with_body("abcd");
        assert_eq!(req.headers_with_content_length().len(), 1);
        assert!(HttpRequest::get("url1").headers_with_content_length().is_empty());
    }

    #[test]
    fn resolve_url_joins_relative_paths() {
        assert_eq!(resolve_url("https://example.com", "url1"), "https://example.com/url1");
        assert_eq!(resolve_url("https://example.com/", "/url1"), "https://example.com/url1");
        assert_eq!(
            resolve_url("https://example.com", "http://other.test/x"),
            "http://other.test/x"
        );
    }

    #[test]
    fn deferred_body_runs_once_and_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut body = ResponseBody::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(b"body3".to_vec())
        });
        assert!(!body.is_loaded());
        assert_eq!(body.read().unwrap(), b"body3");
        assert!(body.is_loaded());
        assert_eq!(body.read().unwrap(), b"body3");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_body_failure_repeats() {
        let mut body = ResponseBody::deferred(|| {
            Err(HttpError::transport("https://example.com/url3", "stream reset"))
        });
        let first = body.read().unwrap_err();
        let second = body.read().unwrap_err();
        assert_eq!(
            first,
            HttpError::transport("https://example.com/url3", "stream reset")
        );
        assert_eq!(first, second);
    }

    #[test]
    fn error_for_status_classifies() {
        let classify = |status| {
            HttpResponse::new(status, "u", ResponseBody::ready(Vec::new()))
                .error_for_status()
                .map(|r| r.status)
        };
        assert_eq!(classify(200), Ok(200));
        assert_eq!(classify(204), Ok(204));
        assert!(matches!(classify(302), Err(HttpError::Redirection { status: 302, .. })));
        assert!(matches!(classify(404), Err(HttpError::Client { status: 404, .. })));
        assert!(matches!(classify(504), Err(HttpError::Server { status: 504, .. })));
        assert!(matches!(classify(600), Err(HttpError::Server { status: 600, .. })));
        assert_eq!(classify(101), Ok(101));
    }

    #[test]
    fn headers_are_lowercased_multi_values() {
        let resp = HttpResponse::new(200, "u", ResponseBody::ready("x"))
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2");
        assert_eq!(resp.headers["set-cookie"], vec!["a=1", "b=2"]);
        assert_eq!(resp.header("SET-COOKIE"), Some("a=1"));
        assert_eq!(resp.header("missing"), None);
    }

    #[test]
    fn json_reports_bad_payloads() {
        let mut resp = HttpResponse::new(200, "u", ResponseBody::ready("not json"));
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, HttpError::Deserialization(_)));
    }
}
