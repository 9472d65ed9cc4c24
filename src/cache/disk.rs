//! Disk-backed thumbnail store.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::codec::ThumbnailRequest;
use crate::error::PersistError;

/// Writes rendered thumbnails to `<dir>/<token>.jpg`.
///
/// The filename is the cache key: it is re-derived from the request with the
/// same codec that decodes inbound paths. There is no index, no eviction and
/// no locking; concurrent writers of the same token race and the last write wins.
#[derive(Debug, Clone)]
pub struct DiskThumbnailStore {
    dir: PathBuf,
}

impl DiskThumbnailStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the thumbnail for `request` is written to.
    pub fn path_for(&self, request: &ThumbnailRequest) -> PathBuf {
        self.dir.join(request.token().file_name())
    }

    /// Write thumbnail bytes, replacing any previous file for the same token.
    pub async fn persist(
        &self,
        request: &ThumbnailRequest,
        data: &[u8],
    ) -> Result<PathBuf, PersistError> {
        let path = self.path_for(request);

        fs::write(&path, data)
            .await
            .map_err(|source| PersistError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), size = data.len(), "Persisted thumbnail");
        Ok(path)
    }
}
