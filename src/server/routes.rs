//! Router configuration for the thumbnail proxy.
//!
//! # Route Structure
//!
//! ```text
//! /{token}.jpg     - Thumbnail endpoint (GET/HEAD)
//! everything else  - Unhandled-request collaborator
//! ```
//!
//! Non-GET methods on the thumbnail route and paths with more than one
//! segment also end up at the unhandled-request collaborator, so the
//! router itself never answers 404 or 405.
//!
//! # Example
//!
//! ```ignore
//! use thumb_proxy::server::{create_router, PipelineConfig, RouterConfig};
//!
//! let router = create_router(service, &pipeline_config, &RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind(pipeline_config.bind_address()).await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use super::handlers::{thumbnail_handler, unhandled_handler, AppState, DEFAULT_CACHE_MAX_AGE};
use super::pipeline::PipelineConfig;
use crate::cache::DiskThumbnailStore;
use crate::fetch::ImageFetcher;
use crate::thumbnail::{ImageTransformer, ThumbnailService};

// =============================================================================
// Router Configuration
// =============================================================================

/// HTTP-level settings that are not part of the pipeline contract.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 day (86400 seconds)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// # Arguments
///
/// * `service` - Decode/fetch/transform pipeline
/// * `pipeline` - Cache directory and fallback collaborators
/// * `config` - CORS, caching and tracing settings
pub fn create_router<F, T>(
    service: ThumbnailService<F, T>,
    pipeline: &PipelineConfig,
    config: &RouterConfig,
) -> Router
where
    F: ImageFetcher + 'static,
    T: ImageTransformer,
{
    create_router_with_tasks(service, pipeline, config, TaskTracker::new())
}

/// Create the application router, spawning cache writes on `persist_tasks`.
///
/// The caller keeps a clone of the tracker and can close and wait on it to
/// drain pending writes.
pub fn create_router_with_tasks<F, T>(
    service: ThumbnailService<F, T>,
    pipeline: &PipelineConfig,
    config: &RouterConfig,
    persist_tasks: TaskTracker,
) -> Router
where
    F: ImageFetcher + 'static,
    T: ImageTransformer,
{
    let state = AppState::new(
        service,
        DiskThumbnailStore::new(pipeline.cache_directory()),
        Arc::clone(pipeline.on_unhandled()),
        Arc::clone(pipeline.on_failure()),
    )
    .with_cache_max_age(config.cache_max_age)
    .with_persist_tasks(persist_tasks);

    let cors = build_cors_layer(config);

    // {filename} is a single segment; nested paths fall through to the router fallback
    let router = Router::new()
        .route(
            "/{filename}",
            get(thumbnail_handler::<F, T>).fallback(unhandled_handler::<F, T>),
        )
        .fallback(unhandled_handler::<F, T>)
        .with_state(state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
