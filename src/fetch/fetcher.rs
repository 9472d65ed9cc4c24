use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::FetchError;

/// Trait for retrieving the raw bytes of a source image.
///
/// Implementations own any host-specific resolution and must report every
/// failure (resolution, transport, bad status, empty body) as a [`FetchError`].
/// They must be thread-safe; one instance serves all concurrent requests.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the image the given source URL points at.
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}
