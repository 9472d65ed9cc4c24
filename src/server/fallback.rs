//! Fallback collaborators for requests the pipeline does not answer itself.
//!
//! The pipeline never writes an error response on its own. Requests that are
//! not thumbnail requests go to an [`UnhandledRequestHandler`]; thumbnail
//! requests that fail at any stage go to a [`RequestFailedHandler`].
//!
//! Both traits are implemented for plain closures and for [`PlaceholderImage`],
//! which answers with a fixed image:
//!
//! ```ignore
//! let config = PipelineConfig::builder()
//!     .port(4000)
//!     .cache_directory("cache")
//!     .on_unhandled(PlaceholderImage::load("static/not-found.png").await?)
//!     .on_failure(|_: &RequestContext, _: &ThumbnailError| StatusCode::BAD_GATEWAY.into_response())
//!     .build()?;
//! ```

use std::io::Cursor;
use std::path::Path;

use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::ThumbnailError;

// =============================================================================
// Request Context
// =============================================================================

/// The parts of an inbound request handed to fallback collaborators.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Answers every request that is not a thumbnail request.
pub trait UnhandledRequestHandler: Send + Sync + 'static {
    fn unhandled_request(&self, request: &RequestContext) -> Response;
}

/// Answers thumbnail requests that failed before a thumbnail was produced.
pub trait RequestFailedHandler: Send + Sync + 'static {
    fn request_failed(&self, request: &RequestContext, error: &ThumbnailError) -> Response;
}

impl<F> UnhandledRequestHandler for F
where
    F: Fn(&RequestContext) -> Response + Send + Sync + 'static,
{
    fn unhandled_request(&self, request: &RequestContext) -> Response {
        self(request)
    }
}

impl<F> RequestFailedHandler for F
where
    F: Fn(&RequestContext, &ThumbnailError) -> Response + Send + Sync + 'static,
{
    fn request_failed(&self, request: &RequestContext, error: &ThumbnailError) -> Response {
        self(request, error)
    }
}

// =============================================================================
// Placeholder Image
// =============================================================================

/// A fixed image served with `200 OK` in place of a thumbnail.
///
/// Loaded once at startup; cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct PlaceholderImage {
    data: Bytes,
    content_type: String,
}

impl PlaceholderImage {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Read a placeholder from disk, taking the content type from its extension.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let content_type = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        Ok(Self::new(data, content_type))
    }

    /// Render a single-colour PNG, for when no placeholder file is configured.
    pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Result<Self, image::ImageError> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut data = Cursor::new(Vec::new());
        img.write_to(&mut data, ImageFormat::Png)?;

        Ok(Self::new(data.into_inner(), "image/png"))
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn response(&self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, self.content_type.clone())],
            self.data.clone(),
        )
            .into_response()
    }
}

impl UnhandledRequestHandler for PlaceholderImage {
    fn unhandled_request(&self, _request: &RequestContext) -> Response {
        self.response()
    }
}

impl RequestFailedHandler for PlaceholderImage {
    fn request_failed(&self, _request: &RequestContext, _error: &ThumbnailError) -> Response {
        self.response()
    }
}
