//! # Thumb Proxy
//!
//! An HTTP service that produces thumbnails on demand.
//!
//! A client asks for `/{token}.jpg`, where the token packs a source image URL
//! and a target size. The service fetches the source, crops it to exactly
//! that size (anchored to the top edge), answers with the JPEG and writes the
//! same bytes to a cache directory under the token's name.
//!
//! ## Architecture
//!
//! - [`codec`] - Token encoding and decoding
//! - [`fetch`] - Source image retrieval over HTTP
//! - [`thumbnail`] - Cropping, re-encoding and the render pipeline
//! - [`cache`] - Write-through persistence of rendered thumbnails
//! - [`server`] - Axum handlers, router, pipeline config and server lifecycle
//! - [`config`] - CLI configuration for the binary
//!
//! ## Example
//!
//! ```rust,no_run
//! use axum::http::StatusCode;
//! use axum::response::{IntoResponse, Response};
//! use thumb_proxy::{
//!     build_http_client, FetchConfig, HttpImageFetcher, JpegCropper, PipelineConfig,
//!     RequestContext, RouterConfig, ThumbServer, ThumbnailError, ThumbnailService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = build_http_client(&FetchConfig::default())?;
//!     let service = ThumbnailService::new(HttpImageFetcher::new(client), JpegCropper::new());
//!
//!     let config = PipelineConfig::builder()
//!         .port(4000)
//!         .cache_directory("cache")
//!         .on_unhandled(|_: &RequestContext| -> Response { StatusCode::NOT_FOUND.into_response() })
//!         .on_failure(|_: &RequestContext, _: &ThumbnailError| -> Response {
//!             StatusCode::BAD_GATEWAY.into_response()
//!         })
//!         .build()?;
//!
//!     let server = ThumbServer::new(service, config, RouterConfig::new());
//!     let addr = server.start().await?;
//!     println!("thumbnails at http://{}", addr);
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod thumbnail;

// Re-export commonly used types
pub use cache::DiskThumbnailStore;
pub use codec::{decode, encode, match_thumbnail_path, CacheToken, ThumbnailRequest};
pub use config::Config;
pub use error::{
    CodecError, ConfigError, FetchError, PersistError, StartupError, ThumbnailError,
    TransformError,
};
pub use fetch::{
    build_http_client, DefaultHostResolver, FetchConfig, HostResolver, HttpImageFetcher,
    ImageFetcher,
};
pub use server::{
    create_router, PipelineConfig, PipelineConfigBuilder, PlaceholderImage, RequestContext,
    RequestFailedHandler, RouterConfig, ThumbServer, UnhandledRequestHandler,
};
pub use thumbnail::{ImageTransformer, JpegCropper, Thumbnail, ThumbnailService};
