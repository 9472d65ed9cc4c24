//! Thumb Proxy - on-demand image thumbnails.
//!
//! This binary starts the HTTP server and configures all components.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thumb_proxy::{
    build_http_client, Config, HttpImageFetcher, JpegCropper, PipelineConfig, PlaceholderImage,
    RouterConfig, ThumbServer, ThumbnailService,
};

/// Built-in placeholder size and colours, used when no image file is given.
const PLACEHOLDER_SIZE: u32 = 16;
const NOT_FOUND_COLOR: [u8; 4] = [224, 224, 224, 255];
const BROKEN_COLOR: [u8; 4] = [200, 60, 60, 255];

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.cache_dir).await {
        error!(
            path = %config.cache_dir.display(),
            error = %e,
            "Failed to create cache directory"
        );
        return ExitCode::FAILURE;
    }

    let not_found = match load_placeholder(config.not_found_image.as_deref(), NOT_FOUND_COLOR).await {
        Ok(image) => image,
        Err(e) => {
            error!("Failed to load not-found image: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let broken = match load_placeholder(config.broken_image.as_deref(), BROKEN_COLOR).await {
        Ok(image) => image,
        Err(e) => {
            error!("Failed to load broken image: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Cache directory: {}", config.cache_dir.display());
    info!("  JPEG quality: {}", config.jpeg_quality);
    info!("  Max dimension: {}", config.max_dimension);
    info!("  Fetch timeout: {}s", config.fetch_timeout);

    let client = match build_http_client(&config.fetch_config()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cropper = JpegCropper::new()
        .with_quality(config.jpeg_quality)
        .with_max_dimension(config.max_dimension);
    let service = ThumbnailService::new(HttpImageFetcher::new(client), cropper);

    let pipeline = match PipelineConfig::builder()
        .host(config.host.clone())
        .port(config.port)
        .cache_directory(config.cache_dir.clone())
        .on_unhandled(not_found)
        .on_failure(broken)
        .build()
    {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = ThumbServer::new(service, pipeline, build_router_config(&config));

    let addr = match server.start().await {
        Ok(addr) => addr,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("  Request thumbnails as: http://{}/<base64url>_<width>_<height>.jpg", addr);
    info!("");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    server.stop().await;

    ExitCode::SUCCESS
}

/// Load a placeholder image from disk, or render a solid one.
async fn load_placeholder(
    path: Option<&Path>,
    color: [u8; 4],
) -> Result<PlaceholderImage, String> {
    match path {
        Some(path) => PlaceholderImage::load(path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e)),
        None => PlaceholderImage::solid_png(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, color)
            .map_err(|e| e.to_string()),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "thumb_proxy=debug,tower_http=debug"
    } else {
        "thumb_proxy=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the CLI Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
