//! JPEG thumbnail cropper.
//!
//! # Design Decisions
//!
//! - **Crop, never pad**: the source is cut to the target aspect ratio and
//!   then scaled, so the output always fills the requested box exactly.
//!
//! - **North gravity**: the kept region is centred horizontally and pinned to
//!   the top edge.
//!
//! - **Crop before scaling**: the crop happens in source pixels, then the
//!   region is resized to the exact target size.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use crate::error::TransformError;

use super::transformer::ImageTransformer;

/// Default output JPEG quality (1-100), i.e. 0.8.
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// Default upper bound for either side of a thumbnail, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

/// Crops source images to an exact size with North gravity and encodes JPEG.
///
/// Accepts JPEG, PNG, GIF (first frame) and WebP input. Transparency is
/// dropped.
#[derive(Debug, Clone)]
pub struct JpegCropper {
    quality: u8,
    max_dimension: u32,
}

impl Default for JpegCropper {
    fn default() -> Self {
        Self::new()
    }
}

impl JpegCropper {
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_THUMBNAIL_QUALITY,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Set the output quality, clamped to 1-100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Crop `source` to `width` x `height` and encode it as JPEG.
    ///
    /// # Errors
    ///
    /// - [`TransformError::InvalidDimensions`] if either side is 0 or above the limit
    /// - [`TransformError::Decode`] if `source` is not a supported image
    /// - [`TransformError::Encode`] if JPEG encoding fails
    pub fn crop(&self, source: &[u8], width: u32, height: u32) -> Result<Bytes, TransformError> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension
        {
            return Err(TransformError::InvalidDimensions {
                width,
                height,
                max: self.max_dimension,
            });
        }

        let img = image::load_from_memory(source).map_err(|e| TransformError::Decode {
            message: e.to_string(),
        })?;

        let (src_width, src_height) = img.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(TransformError::Decode {
                message: "source image has no pixels".to_string(),
            });
        }

        let (x, y, crop_width, crop_height) =
            north_crop_region(src_width, src_height, width, height);
        let thumbnail = img
            .crop_imm(x, y, crop_width, crop_height)
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8();

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.quality)
            .encode_image(&thumbnail)
            .map_err(|e| TransformError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

impl ImageTransformer for JpegCropper {
    fn transform(&self, source: &[u8], width: u32, height: u32) -> Result<Bytes, TransformError> {
        self.crop(source, width, height)
    }
}

/// Region of the source with the target aspect ratio, centred horizontally
/// and anchored to the top edge. Returns `(x, y, width, height)`.
fn north_crop_region(src_width: u32, src_height: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let (sw, sh, w, h) = (
        src_width as u64,
        src_height as u64,
        width as u64,
        height as u64,
    );

    if w * sh >= h * sw {
        // Target is relatively wider: keep full width, trim the bottom.
        let crop_height = ((sw * h + w / 2) / w).clamp(1, sh);
        (0, 0, src_width, crop_height as u32)
    } else {
        // Target is relatively taller: keep full height, trim both sides.
        let crop_width = ((sh * w + h / 2) / h).clamp(1, sw);
        let x = (sw - crop_width) / 2;
        (x as u32, 0, crop_width as u32, src_height)
    }
}

// =============================================================================
// Tests
// =============================================================================
