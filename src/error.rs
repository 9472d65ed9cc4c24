use std::path::PathBuf;

use thiserror::Error;

/// Errors produced when a request path cannot be turned back into a thumbnail request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Token does not follow the `<base64>_<width>_<height>` grammar, or its
    /// payload is not valid base64/UTF-8
    #[error("Malformed thumbnail token {token:?}: {reason}")]
    MalformedToken { token: String, reason: String },
}

/// Errors from retrieving the source image
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Host-specific resolution of the source URL failed
    #[error("Failed to resolve {url}: {message}")]
    Resolve { url: String, message: String },

    /// Resolution succeeded but produced nothing to download
    #[error("No retrieval candidates for {url}")]
    NoCandidates { url: String },

    /// Upstream answered with something other than 200 OK
    #[error("Server failed with HTTP code {status} for {url}")]
    Status { url: String, status: u16 },

    /// Upstream answered 200 OK with an empty body
    #[error("Empty response body from {url}")]
    EmptyBody { url: String },

    /// Network or connection error
    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },
}

/// Errors from cropping and re-encoding the source image
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Requested size is zero or exceeds the configured limit
    #[error("Invalid thumbnail dimensions {width}x{height} (each side must be 1-{max})")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    /// Source bytes are not a decodable image
    #[error("Failed to decode source image: {message}")]
    Decode { message: String },

    /// Cropped image could not be encoded
    #[error("Failed to encode thumbnail: {message}")]
    Encode { message: String },

    /// The blocking transform task panicked or was cancelled
    #[error("Transform task interrupted: {message}")]
    Interrupted { message: String },
}

/// Every way a single thumbnail request can fail before a response is produced.
///
/// All variants are routed to the request-failed collaborator; none are retried.
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    #[error(transparent)]
    MalformedToken(#[from] CodecError),

    /// Decoded source URL is not an absolute URL with a host
    #[error("Invalid source URL {url:?}: {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),
}

impl ThumbnailError {
    /// Short identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ThumbnailError::MalformedToken(_) => "malformed_token",
            ThumbnailError::InvalidSourceUrl { .. } => "invalid_source_url",
            ThumbnailError::Fetch(_) => "fetch_failure",
            ThumbnailError::Transform(_) => "transform_failure",
        }
    }
}

/// Errors writing a rendered thumbnail to the cache directory.
///
/// These happen after the response is already on its way, so they are only logged.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors building a [`PipelineConfig`](crate::server::PipelineConfig)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Port number is required")]
    MissingPort,

    #[error("An unhandled-request handler is required")]
    MissingUnhandledHandler,

    #[error("A request-failed handler is required")]
    MissingFailedHandler,

    #[error("An image storage path is required")]
    MissingCacheDirectory,

    #[error("Invalid image storage path {}: {reason}", path.display())]
    InvalidCacheDirectory { path: PathBuf, reason: String },
}

/// Errors starting the HTTP listener
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
