//! Sequential HTTP call orchestration over an injected transport.
//!
//! # Overview
//! `CallSequencer` sends `GET url1`, `POST url2` (JSON body, `Accept`
//! header) and `GET url3` one after the other and returns the last response.
//! Any transport failure or 3xx/4xx/5xx status stops the sequence at that
//! call and is returned as an `HttpError`.
//!
//! # Design
//! - The network lives behind the `Transport` trait. `UreqTransport` talks
//!   to real servers; `MockTransport` serves canned responses and records
//!   what it was sent.
//! - Transports return every status as data; status classification happens
//!   once, in `HttpResponse::error_for_status`.
//! - Response bodies are lazy (`ResponseBody`), so a body that fails while
//!   streaming fails at the read, after `run` already succeeded.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod sequencer;
pub mod transport;
pub mod types;

pub use config::{ConfigError, TransportConfig};
pub use error::HttpError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use mock::{MockResponse, MockTransport, RecordedRequest};
pub use sequencer::CallSequencer;
pub use transport::{Transport, UreqTransport};
pub use types::SubmitPayload;
