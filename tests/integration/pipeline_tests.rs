//! Pipeline integration tests driven through the router.
//!
//! Tests verify:
//! - Successful thumbnails: status, headers, exact dimensions, persisted bytes
//! - Non-thumbnail requests reach the unhandled collaborator without fetching
//! - Each failing stage reaches the request-failed collaborator

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use thumb_proxy::codec::encode;
use thumb_proxy::{create_router, JpegCropper, RouterConfig, ThumbnailService};

use super::test_utils::{
    cache_file, create_test_jpeg, create_test_png, is_valid_jpeg, jpeg_dimensions,
    pipeline_config, wait_for_file, MockFetcher, ERROR_KIND_HEADER,
};

const CAT_URL: &str = "http://example.com/cat.jpg";

fn router(fetcher: MockFetcher, dir: &std::path::Path) -> Router {
    let service = ThumbnailService::new(fetcher, JpegCropper::new());
    create_router(
        service,
        &pipeline_config(dir),
        &RouterConfig::new().with_tracing(false),
    )
}

async fn get(router: Router, path: &str) -> axum::response::Response {
    send(router, Method::GET, path).await
}

async fn send(router: Router, method: Method, path: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    router.oneshot(request).await.unwrap()
}

fn error_kind(response: &axum::response::Response) -> &str {
    response.headers()[ERROR_KIND_HEADER].to_str().unwrap()
}

// =============================================================================
// Successful Requests
// =============================================================================

#[tokio::test]
async fn test_thumbnail_success() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, create_test_jpeg(400, 300));
    let counter = fetcher.counter();

    let response = get(
        router(fetcher, dir.path()),
        "/aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150.jpg",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    assert_eq!(response.headers()["cache-control"], "public, max-age=86400");
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_jpeg(&body));
    assert_eq!(jpeg_dimensions(&body), (150, 150));

    let persisted = wait_for_file(
        &dir
            .path()
            .join("aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150.jpg"),
    )
    .await
    .expect("thumbnail should be persisted");
    assert_eq!(persisted, body.to_vec());
}

#[tokio::test]
async fn test_thumbnail_exact_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, create_test_jpeg(400, 300));
    let router = router(fetcher, dir.path());

    for (width, height) in [(50, 200), (300, 20), (800, 600), (1, 1)] {
        let token = encode(CAT_URL, width, height);
        let response = get(router.clone(), &token.request_path()).await;
        assert_eq!(response.status(), StatusCode::OK, "{}x{}", width, height);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(jpeg_dimensions(&body), (width, height));
    }
}

#[tokio::test]
async fn test_png_source_becomes_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://images.example.org/tall.png";
    let fetcher = MockFetcher::new().with_image(url, create_test_png(100, 400));

    let token = encode(url, 64, 64);
    let response = get(router(fetcher, dir.path()), &token.request_path()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_jpeg(&body));
    assert_eq!(jpeg_dimensions(&body), (64, 64));
}

#[tokio::test]
async fn test_head_request_is_thumbnail_request() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, create_test_jpeg(40, 30));
    let token = encode(CAT_URL, 10, 10);

    let response = send(router(fetcher, dir.path()), Method::HEAD, &token.request_path()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, create_test_jpeg(40, 30));
    let service = ThumbnailService::new(fetcher, JpegCropper::new());
    let router = create_router(
        service,
        &pipeline_config(dir.path()),
        &RouterConfig::new().with_cache_max_age(60),
    );

    let token = encode(CAT_URL, 10, 10);
    let response = get(router, &token.request_path()).await;
    assert_eq!(response.headers()["cache-control"], "public, max-age=60");
}

// =============================================================================
// Unhandled Requests
// =============================================================================

#[tokio::test]
async fn test_non_thumbnail_paths_are_unhandled() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    let counter = fetcher.counter();
    let router = router(fetcher, dir.path());

    for path in [
        "/",
        "/favicon.ico",
        "/health",
        "/some/nested/path.jpg",
        "/aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150.png",
        "/aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150.jpg",
        "/images/aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150.jpg",
    ] {
        let response = get(router.clone(), path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"not found");
    }

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_source_token_is_unhandled() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    let counter = fetcher.counter();
    let router = router(fetcher, dir.path());

    let token = encode("", 150, 150);
    assert_eq!(token.request_path(), "/_150_150.jpg");

    let response = get(router, &token.request_path()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"not found");

    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join(token.file_name()).exists());
}

#[tokio::test]
async fn test_other_methods_are_unhandled() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, create_test_jpeg(40, 30));
    let counter = fetcher.counter();
    let router = router(fetcher, dir.path());
    let token = encode(CAT_URL, 10, 10);

    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let response = send(router.clone(), method.clone(), &token.request_path()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", method);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Failed Requests
// =============================================================================

#[tokio::test]
async fn test_malformed_token() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    let counter = fetcher.counter();

    let response = get(router(fetcher, dir.path()), "/blahdbldhjfid_150_150.jpg").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(error_kind(&response), "malformed_token");
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_source_url() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    let counter = fetcher.counter();
    let router = router(fetcher, dir.path());

    for url in ["not a url", "/relative/cat.jpg", "file:///etc/passwd"] {
        let token = encode(url, 150, 150);
        let response = get(router.clone(), &token.request_path()).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "{}", url);
        assert_eq!(error_kind(&response), "invalid_source_url");
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_failure_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let token = encode("http://example.com/missing.jpg", 150, 150);

    let response = get(router(MockFetcher::new(), dir.path()), &token.request_path()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(error_kind(&response), "fetch_failure");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!cache_file(dir.path(), &token).exists());
}

#[tokio::test]
async fn test_undecodable_source() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, &b"<html>not an image</html>"[..]);
    let token = encode(CAT_URL, 150, 150);

    let response = get(router(fetcher, dir.path()), &token.request_path()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(error_kind(&response), "transform_failure");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!cache_file(dir.path(), &token).exists());
}

#[tokio::test]
async fn test_invalid_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().with_image(CAT_URL, create_test_jpeg(40, 30));
    let router = router(fetcher, dir.path());

    for (width, height) in [(0, 150), (150, 0), (5000, 10)] {
        let token = encode(CAT_URL, width, height);
        let response = get(router.clone(), &token.request_path()).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "{}x{}", width, height);
        assert_eq!(error_kind(&response), "transform_failure");
    }
}
