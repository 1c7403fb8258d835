//! Runs the fixed three-call sequence over an injected transport.
//!
//! # Design
//! `CallSequencer` holds only its transport. `run` sends `GET url1`, then
//! `POST url2` with a JSON body, then `GET url3`, each one finishing before
//! the next starts. Every response is checked with
//! `HttpResponse::error_for_status`; the first failure ends the run. The
//! final response is handed back with its body still unread, so a body
//! stream failure is reported by the read, not by `run`.

use tracing::{debug, warn};

use crate::error::HttpError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::SubmitPayload;

pub const FIRST_PATH: &str = "url1";
pub const SUBMIT_PATH: &str = "url2";
pub const FINAL_PATH: &str = "url3";

#[derive(Debug, Clone)]
pub struct CallSequencer<T> {
    transport: T,
}

impl<T: Transport> CallSequencer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn build_first_request(&self) -> HttpRequest {
        HttpRequest::get(FIRST_PATH)
    }

    pub fn build_submit_request(&self) -> Result<HttpRequest, HttpError> {
        let body = serde_json::to_vec(&SubmitPayload::default())
            .map_err(|e| HttpError::Serialization(e.to_string()))?;
        Ok(HttpRequest::post(SUBMIT_PATH)
            .with_header("Accept", "application/txt")
            .with_body(body))
    }

    pub fn build_final_request(&self) -> HttpRequest {
        HttpRequest::get(FINAL_PATH)
    }

    /// Send the three requests in order and return the last response.
    ///
    /// Stops at the first transport or status failure; later requests are
    /// not sent.
    pub fn run(&self) -> Result<HttpResponse, HttpError> {
        self.call(&self.build_first_request())?;
        self.call(&self.build_submit_request()?)?;
        self.call(&self.build_final_request())
    }

    fn call(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        debug!(method = %request.method, path = %request.path, "sequenced call");
        self.transport
            .send(request)
            .and_then(HttpResponse::error_for_status)
            .inspect_err(|e| {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "sequence aborted"
                )
            })
    }
}
