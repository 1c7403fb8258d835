//! The transport capability and its blocking `ureq` implementation.
//!
//! # Design
//! A `Transport` performs one exchange and returns the response as data,
//! whatever its status. Classifying statuses is left to the caller so every
//! transport (real or in-memory) reports failures the same way. Only
//! failures below the status line are errors here.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::HttpError;
use crate::http::{resolve_url, HttpMethod, HttpRequest, HttpResponse, ResponseBody};

/// Performs a single HTTP exchange.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
///
/// 4xx/5xx statuses come back as responses, not errors, and the body is
/// streamed only when the caller reads it.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(config.max_redirects)
            .max_redirects_will_error(false)
            .timeout_global(config.timeout())
            .build()
            .new_agent();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn execute(
        &self,
        url: &str,
        request: &HttpRequest,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let headers = &request.headers;
        match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), headers).send(body)
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), headers).send(body),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
        }
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = resolve_url(&self.base_url, &request.path);
        debug!(method = %request.method, url = %url, "sending request");

        let response = self.execute(&url, request).map_err(|e| {
            warn!(method = %request.method, url = %url, error = %e, "request failed");
            HttpError::transport(url.clone(), e.to_string())
        })?;

        let (parts, mut body) = response.into_parts();
        let body_url = url.clone();
        // Read without ureq's default body size cap.
        let body = ResponseBody::deferred(move || {
            body.with_config()
                .limit(u64::MAX)
                .read_to_vec()
                .map_err(|e| HttpError::transport(body_url, e.to_string()))
        });

        let mut out = HttpResponse::new(parts.status.as_u16(), url, body);
        for (name, value) in parts.headers.iter() {
            out = out.with_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        debug!(status = out.status, url = %out.url, "response received");
        Ok(out)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
