//! Host-specific resolution of source URLs.
//!
//! Some image hosts link to an HTML page rather than the image itself. A
//! resolver maps such a link to the URLs that actually serve image bytes.

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

/// Hosts whose bare `/<id>` links are HTML pages for a single image.
const IMGUR_PAGE_HOSTS: [&str; 3] = ["imgur.com", "www.imgur.com", "m.imgur.com"];

/// Trait for turning a source URL into candidate retrieval URLs.
///
/// Candidates are ordered by preference; the fetcher only uses the first.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, url: &Url) -> Result<Vec<Url>, FetchError>;
}

/// Built-in resolver.
///
/// Rewrites bare imgur page links (`https://imgur.com/AbC123`) to the direct
/// image (`https://i.imgur.com/AbC123.jpg`) and passes every other URL through
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct DefaultHostResolver;

impl DefaultHostResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for DefaultHostResolver {
    async fn resolve(&self, url: &Url) -> Result<Vec<Url>, FetchError> {
        Ok(vec![imgur_direct(url).unwrap_or_else(|| url.clone())])
    }
}

fn imgur_direct(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    if !IMGUR_PAGE_HOSTS.contains(&host) {
        return None;
    }

    let mut segments = url.path_segments()?;
    let id = segments.next()?;
    if segments.next().is_some() || id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Url::parse(&format!("https://i.imgur.com/{}.jpg", id)).ok()
}
