//! Write-through persistence of rendered thumbnails.
//!
//! Nothing in the request path reads these files back; they are written so
//! that the cache directory can be served or inspected by other means.

mod disk;

pub use disk::DiskThumbnailStore;
