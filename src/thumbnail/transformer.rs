use bytes::Bytes;

use crate::error::TransformError;

/// Trait for turning source image bytes into a thumbnail of an exact size.
///
/// Transforms are CPU-bound and synchronous; the pipeline runs them on the
/// blocking thread pool, hence the `'static` bound.
pub trait ImageTransformer: Send + Sync + 'static {
    /// Produce a `width` x `height` thumbnail in the output format.
    fn transform(&self, source: &[u8], width: u32, height: u32) -> Result<Bytes, TransformError>;
}
