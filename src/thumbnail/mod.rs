//! Thumbnail rendering.
//!
//! # Components
//!
//! - [`ThumbnailService`]: decode → validate host → fetch → transform
//! - [`ImageTransformer`]: the transform capability seam
//! - [`JpegCropper`]: North-gravity crop and JPEG encode
//! - [`Thumbnail`]: rendered bytes plus the request they answer

mod cropper;
mod service;
mod transformer;

pub use cropper::{JpegCropper, DEFAULT_MAX_DIMENSION, DEFAULT_THUMBNAIL_QUALITY};
pub use service::{validate_source_url, Thumbnail, ThumbnailService};
pub use transformer::ImageTransformer;
