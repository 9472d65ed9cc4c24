//! HTTP request handlers for the thumbnail proxy.
//!
//! # Endpoints
//!
//! - `GET /{token}.jpg` - Render, serve and persist a thumbnail
//! - anything else - Delegated to the unhandled-request collaborator
//!
//! The handlers never build error responses themselves. Every failure is
//! logged and handed to the configured [`RequestFailedHandler`].

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::cache::DiskThumbnailStore;
use crate::codec::{match_thumbnail_path, THUMBNAIL_CONTENT_TYPE};
use crate::fetch::ImageFetcher;
use crate::thumbnail::{ImageTransformer, Thumbnail, ThumbnailService};

use super::fallback::{RequestContext, RequestFailedHandler, UnhandledRequestHandler};

/// Default Cache-Control max-age for rendered thumbnails (one day).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 86400;

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler via Axum's State extractor.
pub struct AppState<F: ImageFetcher, T: ImageTransformer> {
    /// Decode/fetch/transform pipeline
    pub service: ThumbnailService<F, T>,

    /// Where rendered thumbnails are written
    pub store: DiskThumbnailStore,

    pub on_unhandled: Arc<dyn UnhandledRequestHandler>,
    pub on_failure: Arc<dyn RequestFailedHandler>,

    /// Cache-Control max-age in seconds for successful responses
    pub cache_max_age: u32,

    /// In-flight cache writes, drained on shutdown
    pub persist_tasks: TaskTracker,
}

impl<F: ImageFetcher, T: ImageTransformer> AppState<F, T> {
    pub fn new(
        service: ThumbnailService<F, T>,
        store: DiskThumbnailStore,
        on_unhandled: Arc<dyn UnhandledRequestHandler>,
        on_failure: Arc<dyn RequestFailedHandler>,
    ) -> Self {
        Self {
            service,
            store,
            on_unhandled,
            on_failure,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            persist_tasks: TaskTracker::new(),
        }
    }

    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Spawn cache writes on `tasks` so the owner can wait for them.
    pub fn with_persist_tasks(mut self, tasks: TaskTracker) -> Self {
        self.persist_tasks = tasks;
        self
    }
}

impl<F: ImageFetcher, T: ImageTransformer> Clone for AppState<F, T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            store: self.store.clone(),
            on_unhandled: Arc::clone(&self.on_unhandled),
            on_failure: Arc::clone(&self.on_failure),
            cache_max_age: self.cache_max_age,
            persist_tasks: self.persist_tasks.clone(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle a single-segment request that may be a thumbnail request.
///
/// # Endpoint
///
/// `GET /{base64url}_{width}_{height}.jpg`
///
/// # Response
///
/// - `200 OK` with `image/jpeg` body when the thumbnail renders; the bytes
///   are also written to `<cache_dir>/<token>.jpg` in the background
/// - whatever the request-failed collaborator returns when any stage fails
/// - whatever the unhandled collaborator returns when the path is not a
///   thumbnail path
pub async fn thumbnail_handler<F, T>(
    State(state): State<AppState<F, T>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response
where
    F: ImageFetcher + 'static,
    T: ImageTransformer,
{
    let request = RequestContext::new(method, uri, headers);

    let Some(token) = match_thumbnail_path(request.path()) else {
        return state.on_unhandled.unhandled_request(&request);
    };

    match state.service.render(token).await {
        Ok(thumbnail) => {
            info!(
                token = token,
                width = thumbnail.request.width(),
                height = thumbnail.request.height(),
                bytes = thumbnail.data.len(),
                "Served thumbnail"
            );
            let response = thumbnail_response(&thumbnail, state.cache_max_age);
            spawn_persist(&state.persist_tasks, state.store.clone(), thumbnail);
            response
        }
        Err(err) => {
            warn!(
                token = token,
                error_type = err.kind(),
                error = %err,
                "Thumbnail request failed"
            );
            state.on_failure.request_failed(&request, &err)
        }
    }
}

/// Handle every request no route matches.
pub async fn unhandled_handler<F, T>(
    State(state): State<AppState<F, T>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response
where
    F: ImageFetcher + 'static,
    T: ImageTransformer,
{
    let request = RequestContext::new(method, uri, headers);
    state.on_unhandled.unhandled_request(&request)
}

/// Build the success response for a rendered thumbnail.
pub fn thumbnail_response(thumbnail: &Thumbnail, cache_max_age: u32) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE.to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", cache_max_age),
            ),
        ],
        thumbnail.data.clone(),
    )
        .into_response()
}

/// Write a thumbnail to the store without holding up the response.
///
/// The write is tracked by `tasks`, so closing and waiting on the tracker
/// drains it. Failures are logged and otherwise dropped.
pub fn spawn_persist(
    tasks: &TaskTracker,
    store: DiskThumbnailStore,
    thumbnail: Thumbnail,
) -> JoinHandle<()> {
    tasks.spawn(async move {
        if let Err(err) = store.persist(&thumbnail.request, &thumbnail.data).await {
            error!(
                token = %thumbnail.token(),
                error = %err,
                "Failed to persist thumbnail"
            );
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
