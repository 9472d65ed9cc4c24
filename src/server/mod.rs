//! HTTP server layer for the thumbnail proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              GET /{base64url}_{width}_{height}.jpg              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │  fallback   │  │   routes / pipeline     │  │
//! │  │ (requests)  │  │(collaborators)│ │  (router + config)      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! │                                                                 │
//! │                     ThumbServer (start/stop)                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod thumb_server;

pub use fallback::{PlaceholderImage, RequestContext, RequestFailedHandler, UnhandledRequestHandler};
pub use handlers::{
    spawn_persist, thumbnail_handler, thumbnail_response, unhandled_handler, AppState,
    DEFAULT_CACHE_MAX_AGE,
};
pub use pipeline::{PipelineConfig, PipelineConfigBuilder, DEFAULT_BIND_HOST};
pub use routes::{create_router, create_router_with_tasks, RouterConfig};
pub use thumb_server::ThumbServer;
