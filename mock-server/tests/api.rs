use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, Endpoint, ReceivedRequest, Script, REQUEST_ID_HEADER};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn submit_request() -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/url2")
        .header(http::header::ACCEPT, "application/txt")
        .body(r#"{"foo":"bar"}"#.to_string())
        .unwrap()
}

async fn recorded(app: &Router) -> Vec<ReceivedRequest> {
    let resp = app.clone().oneshot(get("/requests")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- default script ---

#[tokio::test]
async fn first_call_answers_body() {
    let resp = app().oneshot(get("/url1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(body_bytes(resp).await, "body");
}

#[tokio::test]
async fn submit_call_answers_body2() {
    let resp = app().oneshot(submit_request()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "body2");
}

#[tokio::test]
async fn final_call_carries_foo_header() {
    let resp = app().oneshot(get("/url3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["foo"], "bar");
    assert_eq!(body_bytes(resp).await, "body3");
}

#[tokio::test]
async fn wrong_method_is_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/url1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- scripting ---

#[tokio::test]
async fn scripted_status_is_returned() {
    let app = app_with(Script::sequence().respond(http::Method::GET, "/url3", Endpoint::status(504)));

    let resp = app.oneshot(get("/url3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn scripted_redirect_keeps_location() {
    let app = app_with(Script::default().respond(
        http::Method::GET,
        "/url3",
        Endpoint::status(302).with_header("location", "/url1"),
    ));

    let resp = app.oneshot(get("/url3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/url1");
}

// --- request log ---

#[tokio::test]
async fn log_starts_empty() {
    let app = app();
    assert!(recorded(&app).await.is_empty());
}

#[tokio::test]
async fn log_records_requests_in_order() {
    let app = app();
    for request in [get("/url1"), submit_request(), get("/url3")] {
        let resp = app.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let log = recorded(&app).await;

    let calls: Vec<(&str, &str)> = log
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(calls, vec![("GET", "/url1"), ("POST", "/url2"), ("GET", "/url3")]);
    assert_eq!(log[1].body, r#"{"foo":"bar"}"#);
    assert!(log[1]
        .headers
        .contains(&("accept".to_string(), "application/txt".to_string())));
    assert_ne!(log[0].id, log[1].id);
}

#[tokio::test]
async fn unknown_paths_are_still_recorded() {
    let app = app();
    let resp = app.clone().oneshot(get("/nowhere")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let log = recorded(&app).await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].path, "/nowhere");
}
