//! Configuration management for the thumbnail proxy binary.
//!
//! Supports:
//! - Command-line arguments via clap
//! - Environment variables with `THUMB_` prefix
//! - Defaults for every setting
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use thumb_proxy::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Caching thumbnails in {}", config.cache_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! - `THUMB_HOST` - Server bind address (default: 0.0.0.0)
//! - `THUMB_PORT` - Server port (default: 4000)
//! - `THUMB_CACHE_DIR` - Directory thumbnails are written to (default: cache)
//! - `THUMB_NOT_FOUND_IMAGE` - Image served for unhandled requests
//! - `THUMB_BROKEN_IMAGE` - Image served for failed thumbnail requests
//! - `THUMB_FETCH_TIMEOUT` - Upstream timeout in seconds (default: 30)
//! - `THUMB_JPEG_QUALITY` - Thumbnail JPEG quality (default: 80)
//! - `THUMB_MAX_DIMENSION` - Largest width or height accepted (default: 4096)
//! - `THUMB_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 86400)
//! - `THUMB_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `THUMB_USER_AGENT` - User-Agent sent upstream

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::fetch::{FetchConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};
use crate::server::{DEFAULT_BIND_HOST, DEFAULT_CACHE_MAX_AGE};
use crate::thumbnail::{DEFAULT_MAX_DIMENSION, DEFAULT_THUMBNAIL_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "cache";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Thumb Proxy - on-demand image thumbnails.
///
/// Serves `/{base64url}_{width}_{height}.jpg` by fetching the encoded source
/// URL, cropping it to the requested size and writing the result to the
/// cache directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "thumb-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_BIND_HOST, env = "THUMB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "THUMB_PORT")]
    pub port: u16,

    /// Directory rendered thumbnails are written to. Created if missing.
    #[arg(long, default_value = DEFAULT_CACHE_DIR, env = "THUMB_CACHE_DIR")]
    pub cache_dir: PathBuf,

    // =========================================================================
    // Placeholder Images
    // =========================================================================
    /// Image served for requests that are not thumbnail requests.
    ///
    /// If not specified, a built-in placeholder is used.
    #[arg(long, env = "THUMB_NOT_FOUND_IMAGE")]
    pub not_found_image: Option<PathBuf>,

    /// Image served when a thumbnail cannot be produced.
    ///
    /// If not specified, a built-in placeholder is used.
    #[arg(long, env = "THUMB_BROKEN_IMAGE")]
    pub broken_image: Option<PathBuf>,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Timeout for fetching a source image, in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "THUMB_FETCH_TIMEOUT")]
    pub fetch_timeout: u64,

    /// User-Agent header sent when fetching source images.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "THUMB_USER_AGENT")]
    pub user_agent: String,

    // =========================================================================
    // Thumbnail Configuration
    // =========================================================================
    /// JPEG quality for thumbnails (1-100).
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_QUALITY, env = "THUMB_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Largest width or height a token may request.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION, env = "THUMB_MAX_DIMENSION")]
    pub max_dimension: u32,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "THUMB_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "THUMB_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err("Cache directory is required. Set --cache-dir or THUMB_CACHE_DIR".to_string());
        }
        if self.cache_dir.exists() && !self.cache_dir.is_dir() {
            return Err(format!(
                "Cache directory {} exists and is not a directory",
                self.cache_dir.display()
            ));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.max_dimension == 0 {
            return Err("max_dimension must be greater than 0".to_string());
        }

        if self.fetch_timeout == 0 {
            return Err("fetch_timeout must be greater than 0".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }

        Ok(())
    }

    /// Upstream client settings derived from this configuration.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.fetch_timeout),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: self.user_agent.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
