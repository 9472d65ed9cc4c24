//! Source image retrieval.
//!
//! ```text
//! source URL ──► HostResolver ──► [candidate URLs] ──► first candidate
//!                                                          │
//!                                    GET, Referer: http://<candidate host>
//!                                                          │
//!                                                          ▼
//!                                                     image bytes
//! ```

mod fetcher;
mod http_fetcher;
mod resolver;

pub use fetcher::ImageFetcher;
pub use http_fetcher::{
    build_http_client, referer_for, FetchConfig, HttpImageFetcher, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT,
};
pub use resolver::{DefaultHostResolver, HostResolver};
