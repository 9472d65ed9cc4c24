//! Test utilities for integration tests.
//!
//! Provides a mock fetcher with call tracking, a local upstream image server
//! that records the headers it receives, fallback collaborators that expose
//! the failure kind, and JPEG/PNG fixtures.

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use url::Url;

use thumb_proxy::error::FetchError;
use thumb_proxy::fetch::ImageFetcher;
use thumb_proxy::server::{PipelineConfig, RequestContext};
use thumb_proxy::ThumbnailError;

/// Header the failure collaborator uses to report which stage failed.
pub const ERROR_KIND_HEADER: &str = "x-error-kind";

// =============================================================================
// Mock Fetcher with Request Tracking
// =============================================================================

/// An in-memory fetcher keyed by URL. Unknown URLs fail with `404`.
#[derive(Clone, Default)]
pub struct MockFetcher {
    images: HashMap<String, Bytes>,
    fetch_count: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.images.insert(url.into(), data.into());
        self
    }

    /// Shared counter, readable after the fetcher has moved into a service.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_count)
    }
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        self.images
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

// =============================================================================
// Fallback Collaborators
// =============================================================================

pub fn not_found(_request: &RequestContext) -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

pub fn broken(_request: &RequestContext, error: &ThumbnailError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(ERROR_KIND_HEADER, error.kind())],
        "broken",
    )
        .into_response()
}

/// Pipeline config on an ephemeral localhost port with the collaborators above.
pub fn pipeline_config(cache_dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .cache_directory(cache_dir)
        .on_unhandled(not_found)
        .on_failure(broken)
        .build()
        .unwrap()
}

// =============================================================================
// Local Upstream Server
// =============================================================================

/// A local HTTP server standing in for a remote image host.
///
/// Routes:
/// - `/photo.jpg` - 200, 400x300 JPEG
/// - `/tall.png` - 200, 100x400 PNG
/// - `/forbidden.jpg` - 403
/// - `/empty.jpg` - 200 with an empty body
/// - `/not-an-image.jpg` - 200 with HTML
pub struct Upstream {
    pub addr: SocketAddr,
    referers: Arc<RwLock<Vec<String>>>,
    hits: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct UpstreamState {
    referers: Arc<RwLock<Vec<String>>>,
    hits: Arc<AtomicUsize>,
    photo: Bytes,
    tall: Bytes,
}

impl Upstream {
    pub async fn spawn() -> Self {
        let referers = Arc::new(RwLock::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        let state = UpstreamState {
            referers: Arc::clone(&referers),
            hits: Arc::clone(&hits),
            photo: Bytes::from(create_test_jpeg(400, 300)),
            tall: Bytes::from(create_test_png(100, 400)),
        };

        let app = Router::new()
            .route("/photo.jpg", get(photo))
            .route("/tall.png", get(tall))
            .route("/forbidden.jpg", get(forbidden))
            .route("/empty.jpg", get(empty))
            .route("/not-an-image.jpg", get(not_an_image))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            referers,
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Referer headers received so far, in order.
    pub async fn referers(&self) -> Vec<String> {
        self.referers.read().await.clone()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn record(state: &UpstreamState, headers: &HeaderMap) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.referers.write().await.push(referer);
}

async fn photo(State(state): State<UpstreamState>, headers: HeaderMap) -> Response {
    record(&state, &headers).await;
    ([(header::CONTENT_TYPE, "image/jpeg")], state.photo.clone()).into_response()
}

async fn tall(State(state): State<UpstreamState>, headers: HeaderMap) -> Response {
    record(&state, &headers).await;
    ([(header::CONTENT_TYPE, "image/png")], state.tall.clone()).into_response()
}

async fn forbidden(State(state): State<UpstreamState>, headers: HeaderMap) -> Response {
    record(&state, &headers).await;
    StatusCode::FORBIDDEN.into_response()
}

async fn empty(State(state): State<UpstreamState>, headers: HeaderMap) -> Response {
    record(&state, &headers).await;
    ([(header::CONTENT_TYPE, "image/jpeg")], Bytes::new()).into_response()
}

async fn not_an_image(State(state): State<UpstreamState>, headers: HeaderMap) -> Response {
    record(&state, &headers).await;
    ([(header::CONTENT_TYPE, "text/html")], "<html>moved</html>").into_response()
}

/// A localhost address with nothing listening on it.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// =============================================================================
// Image Fixtures
// =============================================================================

/// Create an RGB JPEG whose top half is red and bottom half is blue.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |_, y| {
        if y < height / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Create a translucent RGBA PNG.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 200, 0, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =============================================================================
// Validation Helpers
// =============================================================================

/// Check if data is a valid JPEG.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }

    // SOI and EOI markers
    if data[0] != 0xFF || data[1] != 0xD8 {
        return false;
    }
    if data[data.len() - 2] != 0xFF || data[data.len() - 1] != 0xD9 {
        return false;
    }

    image::load_from_memory_with_format(data, ImageFormat::Jpeg).is_ok()
}

/// Decoded dimensions of a JPEG.
pub fn jpeg_dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg).unwrap();
    (img.width(), img.height())
}

/// Poll until `path` exists, or give up after two seconds.
///
/// Persistence runs after the response is sent, so the file appears some
/// time later. Reads once more after a short pause to avoid a half-written file.
pub async fn wait_for_file(path: &Path) -> Option<Vec<u8>> {
    for _ in 0..200 {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            return tokio::fs::read(path).await.ok();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

/// Cache file path for a token under `dir`.
pub fn cache_file(dir: &Path, token: &thumb_proxy::CacheToken) -> PathBuf {
    dir.join(token.file_name())
}
