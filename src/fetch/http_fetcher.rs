//! HTTP implementation of [`ImageFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::REFERER;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::FetchError;

use super::fetcher::ImageFetcher;
use super::resolver::{DefaultHostResolver, HostResolver};

/// Default upstream request timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default number of redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default `User-Agent` sent upstream.
pub const DEFAULT_USER_AGENT: &str = concat!("thumb-proxy/", env!("CARGO_PKG_VERSION"));

/// Settings for the upstream HTTP client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Build the shared HTTP client used for upstream fetches.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .user_agent(config.user_agent.clone())
        .build()
}

/// The `Referer` sent with a fetch: the candidate's own host over plain http.
///
/// Many image hosts refuse hot-linked requests whose referrer is foreign;
/// claiming to come from the host itself gets past that check.
pub fn referer_for(url: &Url) -> String {
    format!("http://{}", url.host_str().unwrap_or_default())
}

/// Fetches source images over HTTP(S).
///
/// Resolves the source URL with `R`, issues a single GET for the first
/// candidate and accepts only `200 OK` with a non-empty body. No retries.
#[derive(Clone)]
pub struct HttpImageFetcher<R: HostResolver = DefaultHostResolver> {
    client: Client,
    resolver: R,
}

impl HttpImageFetcher<DefaultHostResolver> {
    /// Create a fetcher with the built-in resolver.
    pub fn new(client: Client) -> Self {
        Self::with_resolver(client, DefaultHostResolver::new())
    }
}

impl<R: HostResolver> HttpImageFetcher<R> {
    pub fn with_resolver(client: Client, resolver: R) -> Self {
        Self { client, resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

#[async_trait]
impl<R: HostResolver> ImageFetcher for HttpImageFetcher<R> {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let target = self
            .resolver
            .resolve(url)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NoCandidates {
                url: url.to_string(),
            })?;

        let referer = referer_for(&target);
        debug!(url = %target, referer = %referer, "Fetching source image");

        let connection_error = |e: reqwest::Error| FetchError::Connection {
            url: target.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(target.clone())
            .header(REFERER, referer)
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(connection_error)?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody {
                url: target.to_string(),
            });
        }

        debug!(url = %target, bytes = body.len(), "Fetched source image");
        Ok(body)
    }
}
