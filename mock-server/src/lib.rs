use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub use axum::http::Method;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A request as the server received it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceivedRequest {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// What the server answers for one method and path.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Endpoint {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Scripted endpoints keyed by method and path.
#[derive(Clone, Debug, Default)]
pub struct Script {
    endpoints: HashMap<(String, String), Endpoint>,
}

impl Script {
    /// `GET /url1`, `POST /url2` and `GET /url3` all answering 200.
    pub fn sequence() -> Self {
        Self::default()
            .respond(Method::GET, "/url1", Endpoint::ok("body"))
            .respond(Method::POST, "/url2", Endpoint::ok("body2"))
            .respond(Method::GET, "/url3", Endpoint::ok("body3").with_header("foo", "bar"))
    }

    pub fn respond(mut self, method: Method, path: &str, endpoint: Endpoint) -> Self {
        self.endpoints
            .insert((method.as_str().to_string(), path.to_string()), endpoint);
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<&Endpoint> {
        self.endpoints
            .get(&(method.as_str().to_string(), path.to_string()))
    }
}

pub type Log = Arc<RwLock<Vec<ReceivedRequest>>>;

#[derive(Clone)]
struct AppState {
    script: Arc<Script>,
    log: Log,
}

pub fn app() -> Router {
    app_with(Script::sequence())
}

pub fn app_with(script: Script) -> Router {
    let state = AppState {
        script: Arc::new(script),
        log: Arc::new(RwLock::new(Vec::new())),
    };
    Router::new()
        .route("/requests", get(list_requests))
        .fallback(handle)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Script::sequence()).await
}

pub async fn run_with(listener: TcpListener, script: Script) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(script)).await
}

async fn list_requests(State(state): State<AppState>) -> Json<Vec<ReceivedRequest>> {
    Json(state.log.read().await.clone())
}

async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let received = ReceivedRequest {
        id: Uuid::new_v4(),
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    tracing::info!(id = %received.id, method = %received.method, path = %received.path, "request recorded");
    let id = received.id;
    state.log.write().await.push(received);

    let Some(endpoint) = state.script.lookup(&method, uri.path()) else {
        return (StatusCode::NOT_FOUND, request_id_header(id)).into_response();
    };

    let status = StatusCode::from_u16(endpoint.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response_headers = request_id_header(id);
    for (name, value) in &endpoint.headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                response_headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "invalid scripted header skipped"),
        }
    }
    (status, response_headers, endpoint.body.clone()).into_response()
}

fn request_id_header(id: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers
}
