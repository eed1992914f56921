//! Per-job scratch directories.
//!
//! Every job (and every synchronous request) owns exactly one
//! [`ScratchSpace`]. The directory is removed by [`ScratchSpace::cleanup`], or
//! on drop if cleanup was never reached.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Isolated working directory under a shared scratch root.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Allocate a fresh directory `<root>/<label>-XXXXXX`.
    pub async fn create(root: &Path, label: &str) -> MediaResult<Self> {
        fs::create_dir_all(root).await?;

        let root = root.to_path_buf();
        let prefix = format!("{}-", label);
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempdir_in(&root)
        })
        .await
        .map_err(|e| MediaError::internal(format!("scratch allocation panicked: {}", e)))??;

        debug!("Allocated scratch space {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the scratch directory.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Move a file out of the scratch directory before it is reclaimed.
    ///
    /// Falls back to copy-and-delete when `dst` is on another filesystem.
    pub async fn persist(&self, src: &Path, dst: &Path) -> MediaResult<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::rename(src, dst).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_across(src, dst).await,
            Err(e) => Err(MediaError::from(e)),
        }
    }

    /// Remove the directory and everything in it.
    pub async fn cleanup(self) -> MediaResult<()> {
        let path = self.dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .map_err(|e| MediaError::internal(format!("scratch cleanup panicked: {}", e)))??;
        debug!("Reclaimed scratch space {}", path.display());
        Ok(())
    }
}

/// Copy `src` next to `dst`, rename it into place, then drop the source.
async fn copy_across(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("partial");
    fs::copy(src, &tmp_dst).await?;
    fs::rename(&tmp_dst, dst).await?;
    if let Err(e) = fs::remove_file(src).await {
        warn!("Failed to remove {} after copy: {}", src.display(), e);
    }
    Ok(())
}
