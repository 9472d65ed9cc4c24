//! Construction-time configuration of the thumbnail pipeline.
//!
//! Everything here is validated once in [`PipelineConfigBuilder::build`] and
//! immutable afterwards. Building never touches the network.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;

use super::fallback::{RequestFailedHandler, UnhandledRequestHandler};

/// Default address the server binds to.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Validated pipeline configuration.
#[derive(Clone)]
pub struct PipelineConfig {
    host: String,
    port: u16,
    cache_directory: PathBuf,
    on_unhandled: Arc<dyn UnhandledRequestHandler>,
    on_failure: Arc<dyn RequestFailedHandler>,
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port to listen on. `0` asks the OS for a free port.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    pub fn on_unhandled(&self) -> &Arc<dyn UnhandledRequestHandler> {
        &self.on_unhandled
    }

    pub fn on_failure(&self) -> &Arc<dyn RequestFailedHandler> {
        &self.on_failure
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cache_directory", &self.cache_directory)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PipelineConfig`].
///
/// `port`, `cache_directory`, `on_unhandled` and `on_failure` are required.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    cache_directory: Option<PathBuf>,
    on_unhandled: Option<Arc<dyn UnhandledRequestHandler>>,
    on_failure: Option<Arc<dyn RequestFailedHandler>>,
}

impl PipelineConfigBuilder {
    /// Bind host. Defaults to [`DEFAULT_BIND_HOST`].
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Directory rendered thumbnails are written to.
    pub fn cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }

    pub fn on_unhandled(mut self, handler: impl UnhandledRequestHandler) -> Self {
        self.on_unhandled = Some(Arc::new(handler));
        self
    }

    pub fn on_failure(mut self, handler: impl RequestFailedHandler) -> Self {
        self.on_failure = Some(Arc::new(handler));
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field. The cache directory is
    /// checked against the filesystem: it need not exist yet, but a path that
    /// exists and is not a directory (a regular file, `/dev/null`) is
    /// rejected with [`ConfigError::InvalidCacheDirectory`].
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let port = self.port.ok_or(ConfigError::MissingPort)?;
        let on_unhandled = self
            .on_unhandled
            .ok_or(ConfigError::MissingUnhandledHandler)?;
        let on_failure = self.on_failure.ok_or(ConfigError::MissingFailedHandler)?;
        let cache_directory = self
            .cache_directory
            .ok_or(ConfigError::MissingCacheDirectory)?;

        if cache_directory.as_os_str().is_empty() {
            return Err(ConfigError::InvalidCacheDirectory {
                path: cache_directory,
                reason: "path is empty".to_string(),
            });
        }
        if cache_directory.exists() && !cache_directory.is_dir() {
            return Err(ConfigError::InvalidCacheDirectory {
                path: cache_directory,
                reason: "not a directory".to_string(),
            });
        }

        Ok(PipelineConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            port,
            cache_directory,
            on_unhandled,
            on_failure,
        })
    }
}
