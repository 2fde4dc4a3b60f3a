//! Bundle archive extraction
//!
//! Bundles are gzip-compressed tar archives. Extraction runs on a blocking
//! task so the decompression loop never stalls the async scheduler.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::errors::WorkerError;

/// Extract a tar.gz archive into `dest`, creating it if absent
pub async fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), WorkerError> {
    let archive_path: PathBuf = archive_path.to_owned();
    let dest: PathBuf = dest.to_owned();

    spawn_blocking(move || extract_tar_gz_sync(&archive_path, &dest))
        .await
        .map_err(|e| WorkerError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_tar_gz_sync(archive_path: &Path, dest: &Path) -> Result<(), WorkerError> {
    std::fs::create_dir_all(dest)?;

    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive
        .unpack(dest)
        .map_err(|e| WorkerError::StageError(format!("Corrupt bundle archive: {}", e)))?;

    debug!(
        "Extracted bundle {} to {}",
        archive_path.display(),
        dest.display()
    );
    Ok(())
}
