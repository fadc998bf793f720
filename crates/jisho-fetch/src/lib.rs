use std::path::{Path, PathBuf};

use jisho_core::StageOutcome;
use tokio_util::sync::CancellationToken;

pub mod download;
pub mod error;
pub mod extract;
pub mod release;

#[cfg(test)]
mod testutil;

pub use download::download_to;
pub use error::FetchError;
pub use extract::{ArchiveFormat, extract_single_entry};
pub use release::{GithubReleaseFetcher, ReleaseAsset};

/// Progress callback receiving a fraction in `0.0..=1.0`
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Source of the dataset archive
#[async_trait::async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Find the newest archive matching the configured naming convention
    async fn resolve_latest(&self) -> Result<ReleaseAsset, FetchError>;

    /// Store the asset at `destination`.
    ///
    /// Cancellation is not a failure: it yields [`StageOutcome::Cancelled`]
    /// and leaves nothing behind at `destination`.
    async fn download(
        &self,
        asset: &ReleaseAsset,
        destination: &Path,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<PathBuf>, FetchError>;
}

/// Sibling path used while a file is still being written
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Promote a finished `.part` file, or remove it when the stage did not complete
pub(crate) fn finish_partial<T>(
    partial: &Path,
    destination: &Path,
    result: Result<StageOutcome<T>, FetchError>,
) -> Result<StageOutcome<PathBuf>, FetchError> {
    match result {
        Ok(StageOutcome::Completed(_)) => {
            std::fs::rename(partial, destination)?;
            Ok(StageOutcome::Completed(destination.to_path_buf()))
        }
        Ok(StageOutcome::Cancelled) => {
            remove_quietly(partial);
            Ok(StageOutcome::Cancelled)
        }
        Err(e) => {
            remove_quietly(partial);
            Err(e)
        }
    }
}

pub(crate) fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
