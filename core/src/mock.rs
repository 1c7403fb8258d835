//! In-memory `Transport` with canned responses, for tests.
//!
//! `MockTransport` hands out queued `MockResponse` values (or the result of
//! queued callbacks) in order, one per request, and records every request it
//! sees with its resolved URL, wire headers and body.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::HttpError;
use crate::http::{resolve_url, HttpMethod, HttpRequest, HttpResponse, ResponseBody};
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://example.com";

/// A request as the mock transport received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    /// Headers rendered as `Name: value` lines.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect()
    }

    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }
}

#[derive(Debug, Clone)]
enum MockBody {
    Bytes(Vec<u8>),
    Fails(String),
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    headers: BTreeMap<String, Vec<String>>,
    body: MockBody,
    send_error: Option<String>,
}

impl MockResponse {
    /// A 200 response with the given body and no headers.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: MockBody::Bytes(body.into()),
            send_error: None,
        }
    }

    /// Fails at send time, as an unreachable host would.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            send_error: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Answers 200 but fails when the body is read.
    pub fn failing_body(message: impl Into<String>) -> Self {
        Self {
            body: MockBody::Fails(message.into()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    fn into_response(self, url: String) -> Result<HttpResponse, HttpError> {
        if let Some(message) = self.send_error {
            return Err(HttpError::transport(url, message));
        }
        let body = match self.body {
            MockBody::Bytes(bytes) => ResponseBody::ready(bytes),
            MockBody::Fails(message) => {
                let body_url = url.clone();
                ResponseBody::deferred(move || Err(HttpError::transport(body_url, message)))
            }
        };
        let mut response = HttpResponse::new(self.status, url, body);
        response.headers = self.headers;
        Ok(response)
    }
}

type Callback = Box<dyn FnOnce(&RecordedRequest) -> MockResponse + Send>;

enum Canned {
    Response(MockResponse),
    Callback(Callback),
}

/// `Transport` that serves canned responses from a queue.
///
/// An exhausted queue fails the request with `HttpError::Transport`; the
/// request is still recorded.
pub struct MockTransport {
    base_url: String,
    queue: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let transport = Self::empty();
        transport.set_responses(responses);
        transport
    }

    /// Each callback answers one request, in order.
    pub fn with_callbacks<I, F>(callbacks: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(&RecordedRequest) -> MockResponse + Send + 'static,
    {
        let transport = Self::empty();
        transport.set_callbacks(callbacks);
        transport
    }

    pub fn empty() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the queue with canned responses.
    pub fn set_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        *self.queue.lock().unwrap_or_else(PoisonError::into_inner) =
            responses.into_iter().map(Canned::Response).collect();
    }

    /// Replace the queue with callbacks.
    pub fn set_callbacks<I, F>(&self, callbacks: I)
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(&RecordedRequest) -> MockResponse + Send + 'static,
    {
        *self.queue.lock().unwrap_or_else(PoisonError::into_inner) = callbacks
            .into_iter()
            .map(|cb| Canned::Callback(Box::new(cb)))
            .collect();
    }

    pub fn requests_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("base_url", &self.base_url)
            .field("requests", &self.requests_count())
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let recorded = RecordedRequest {
            method: request.method,
            url: resolve_url(&self.base_url, &request.path),
            headers: request.headers_with_content_length(),
            body: request.body.clone(),
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded.clone());

        let next = self.queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        debug!(method = %recorded.method, url = %recorded.url, "mock request");
        let canned = match next {
            Some(Canned::Response(response)) => response,
            Some(Canned::Callback(callback)) => callback(&recorded),
            None => return Err(HttpError::transport(recorded.url, "response queue is empty")),
        };
        canned.into_response(recorded.url)
    }
}
