use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn empty(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- anything ---

#[tokio::test]
async fn anything_echoes_query_and_headers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/anything?a=1&a=2")
                .header("x-trace", "abc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("a=1&a=2"));
    assert_eq!(echo.headers["x-trace"], "abc");
}

#[tokio::test]
async fn anything_echoes_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/anything")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"a":1}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.body, r#"{"a":1}"#);
    assert_eq!(echo.headers["content-type"], "application/json");
    assert!(echo.query.is_none());
}

// --- json ---

#[tokio::test]
async fn json_document_is_json() {
    let resp = app().oneshot(empty("GET", "/json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/json"
    );
    let value: serde_json::Value = body_json(resp).await;
    assert_eq!(value["name"], "potion");
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    let resp = app().oneshot(empty("DELETE", "/status/404")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await, "status 404");
}

#[tokio::test]
async fn status_rejects_non_numeric_code() {
    let resp = app().oneshot(empty("GET", "/status/teapot")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- stream ---

#[tokio::test]
async fn stream_concatenates_chunks() {
    let resp = app().oneshot(empty("GET", "/stream/3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "chunk-0\nchunk-1\nchunk-2\n");
}

// --- redirect ---

#[tokio::test]
async fn redirect_points_at_anything() {
    let resp = app().oneshot(empty("GET", "/redirect")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/anything");
    assert!(body_bytes(resp).await.is_empty());
}
