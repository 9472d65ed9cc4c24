//! Thumbnail Service for orchestrating thumbnail generation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ThumbnailService                          │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                      render()                           │    │
//! │  │  1. Decode token      3. Fetch source bytes             │    │
//! │  │  2. Validate host     4. Crop / re-encode               │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │     ┌───────────┐      ┌──────────────┐    ┌──────────────────┐ │
//! │     │   codec   │      │ ImageFetcher │    │ ImageTransformer │ │
//! │     └───────────┘      └──────────────┘    └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stages run strictly in order and the first failure ends the request.
//! Responding and persisting happen in the HTTP layer.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::codec::{decode, CacheToken, ThumbnailRequest};
use crate::error::{ThumbnailError, TransformError};
use crate::fetch::ImageFetcher;

use super::transformer::ImageTransformer;

// =============================================================================
// Thumbnail
// =============================================================================

/// A rendered thumbnail and the request it answers.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub request: ThumbnailRequest,

    /// Encoded output image
    pub data: Bytes,
}

impl Thumbnail {
    /// Token naming this thumbnail, re-derived from the request.
    pub fn token(&self) -> CacheToken {
        self.request.token()
    }
}

// =============================================================================
// Thumbnail Service
// =============================================================================

/// Service that turns a token into thumbnail bytes.
///
/// # Type Parameters
///
/// * `F` - Source image fetcher
/// * `T` - Image transformer
///
/// # Example
///
/// ```ignore
/// use thumb_proxy::fetch::{build_http_client, FetchConfig, HttpImageFetcher};
/// use thumb_proxy::thumbnail::{JpegCropper, ThumbnailService};
///
/// let client = build_http_client(&FetchConfig::default())?;
/// let service = ThumbnailService::new(HttpImageFetcher::new(client), JpegCropper::new());
///
/// let thumbnail = service.render("aHR0cDovL2V4YW1wbGUuY29tL2NhdC5qcGc-_150_150").await?;
/// println!("{} bytes", thumbnail.data.len());
/// ```
pub struct ThumbnailService<F: ImageFetcher, T: ImageTransformer> {
    fetcher: Arc<F>,
    transformer: Arc<T>,
}

impl<F: ImageFetcher, T: ImageTransformer> Clone for ThumbnailService<F, T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            transformer: Arc::clone(&self.transformer),
        }
    }
}

impl<F: ImageFetcher, T: ImageTransformer> ThumbnailService<F, T> {
    pub fn new(fetcher: F, transformer: T) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            transformer: Arc::new(transformer),
        }
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    pub fn transformer(&self) -> &Arc<T> {
        &self.transformer
    }

    /// Render the thumbnail a token stands for.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailError::MalformedToken`] if the token cannot be decoded;
    ///   nothing is fetched
    /// - [`ThumbnailError::InvalidSourceUrl`] if the decoded URL has no host;
    ///   nothing is fetched
    /// - [`ThumbnailError::Fetch`] if the source cannot be retrieved
    /// - [`ThumbnailError::Transform`] if the source cannot be cropped
    pub async fn render(&self, token: &str) -> Result<Thumbnail, ThumbnailError> {
        let request = decode(token)?;
        debug!(
            token = token,
            url = request.source_url(),
            width = request.width(),
            height = request.height(),
            "Decoded thumbnail token"
        );

        let url = validate_source_url(request.source_url())?;

        let source = self.fetcher.fetch(&url).await?;

        let data = self
            .transform(source, request.width(), request.height())
            .await?;
        debug!(token = token, bytes = data.len(), "Rendered thumbnail");

        Ok(Thumbnail { request, data })
    }

    /// Run the transformer on the blocking pool.
    async fn transform(&self, source: Bytes, width: u32, height: u32) -> Result<Bytes, TransformError> {
        let transformer = Arc::clone(&self.transformer);

        tokio::task::spawn_blocking(move || transformer.transform(&source, width, height))
            .await
            .map_err(|e| TransformError::Interrupted {
                message: e.to_string(),
            })?
    }
}

/// Parse a decoded source URL, requiring an absolute URL with a non-empty host.
pub fn validate_source_url(raw: &str) -> Result<Url, ThumbnailError> {
    let invalid = |reason: &str| ThumbnailError::InvalidSourceUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(invalid("URL has no host")),
    }
}

// =============================================================================
// Tests
// =============================================================================
