//! Model transfer service
//!
//! Moves a model snapshot from the hub to local disk, then from local disk
//! to object storage. Both steps are idempotent: an already populated
//! download directory is reused and objects that already exist are skipped.

use cmi_client::{ModelHub, ObjectStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::TransferError;

/// Suffix of files still being downloaded
const PARTIAL_SUFFIX: &str = ".incomplete";

/// Counts of an upload run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub skipped: usize,
}

/// Downloads model snapshots and uploads them to object storage
#[derive(Clone)]
pub struct ModelTransfer {
    hub: Arc<dyn ModelHub>,
    store: Arc<dyn ObjectStore>,
}

impl ModelTransfer {
    pub fn new(hub: Arc<dyn ModelHub>, store: Arc<dyn ObjectStore>) -> Self {
        Self { hub, store }
    }

    /// Downloads every file of a hub repository into `dir`
    ///
    /// Skipped entirely when `dir` already holds a finished snapshot. A
    /// directory left with partial downloads by an interrupted run is
    /// downloaded again.
    ///
    /// # Returns
    /// Number of files downloaded
    pub async fn download(&self, repo_id: &str, dir: &Path) -> Result<usize, TransferError> {
        info!("Downloading model from hub: {}", repo_id);

        let root = dir.to_path_buf();
        let state = tokio::task::spawn_blocking(move || snapshot_state(&root))
            .await
            .map_err(|e| io_error(dir, std::io::Error::other(e)))?
            .map_err(|source| io_error(dir, source))?;

        match state {
            SnapshotState::Complete => {
                info!("Model already downloaded at: {}", dir.display());
                return Ok(0);
            }
            SnapshotState::Partial(leftovers) => {
                warn!(
                    "Found {} partial download(s) in {}, downloading again",
                    leftovers.len(),
                    dir.display()
                );
                for path in leftovers {
                    tokio::fs::remove_file(&path)
                        .await
                        .map_err(|source| io_error(&path, source))?;
                }
            }
            SnapshotState::Empty => {}
        }

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| io_error(dir, source))?;

        let files = self
            .hub
            .list_files(repo_id)
            .await
            .map_err(|source| download_error(repo_id, source))?;

        info!("Repository {} has {} file(s)", repo_id, files.len());

        let mut total_bytes = 0u64;
        for filename in &files {
            let dest = dir.join(filename);
            let bytes = self
                .hub
                .download_file(repo_id, filename, &dest)
                .await
                .map_err(|source| download_error(repo_id, source))?;
            total_bytes += bytes;
            info!("Downloaded {} ({} bytes)", filename, bytes);
        }

        info!(
            "Model downloaded successfully to: {} ({} bytes)",
            dir.display(),
            total_bytes
        );
        Ok(files.len())
    }

    /// Uploads every file under `dir` to `bucket` below `prefix`
    ///
    /// The object key is the prefix joined with the file's path relative to
    /// `dir`. Objects that already exist are left untouched.
    pub async fn upload(
        &self,
        dir: &Path,
        bucket: &str,
        prefix: &str,
    ) -> Result<UploadSummary, TransferError> {
        info!("Uploading model to bucket: {}", bucket);

        let root = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&root))
            .await
            .map_err(|e| io_error(dir, std::io::Error::other(e)))?
            .map_err(|source| io_error(dir, source))?;

        let mut summary = UploadSummary::default();

        for path in files {
            let relative = path.strip_prefix(dir).unwrap_or(&path);
            let key = object_key(prefix, relative);

            let exists = self
                .store
                .exists(bucket, &key)
                .await
                .map_err(|source| upload_error(&path, source))?;

            if exists {
                info!("Model file already exists in storage: {}", key);
                summary.skipped += 1;
                continue;
            }

            self.store
                .upload_file(bucket, &key, &path)
                .await
                .map_err(|source| upload_error(&path, source))?;
            info!("Uploaded model file: {}", key);
            summary.uploaded += 1;
        }

        info!(
            "Model uploaded successfully to bucket {} ({} uploaded, {} already present)",
            bucket, summary.uploaded, summary.skipped
        );
        Ok(summary)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TransferError {
    error!("I/O error on {}: {}", path.display(), source);
    TransferError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn download_error(repo_id: &str, source: cmi_client::ClientError) -> TransferError {
    error!("Error downloading model {}: {}", repo_id, source);
    TransferError::Download {
        repo_id: repo_id.to_string(),
        source,
    }
}

fn upload_error(path: &Path, source: cmi_client::ClientError) -> TransferError {
    error!("Error uploading {}: {}", path.display(), source);
    TransferError::Upload {
        path: path.to_path_buf(),
        source,
    }
}

/// What a download directory holds
#[derive(Debug, PartialEq, Eq)]
enum SnapshotState {
    /// Missing or empty
    Empty,
    /// Contains partial downloads, listed here
    Partial(Vec<PathBuf>),
    Complete,
}

fn snapshot_state(dir: &Path) -> std::io::Result<SnapshotState> {
    let mut entries = 0usize;
    let mut partial = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let read = match std::fs::read_dir(&current) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && current == dir => {
                return Ok(SnapshotState::Empty);
            }
            Err(e) => return Err(e),
        };

        for entry in read {
            let entry = entry?;
            entries += 1;
            if entry.file_type()?.is_dir() {
                pending.push(entry.path());
            } else if entry.file_name().to_string_lossy().ends_with(PARTIAL_SUFFIX) {
                partial.push(entry.path());
            }
        }
    }

    Ok(match (entries, partial.is_empty()) {
        (0, _) => SnapshotState::Empty,
        (_, true) => SnapshotState::Complete,
        (_, false) => SnapshotState::Partial(partial),
    })
}

/// Recursively lists regular files under `root`, sorted
///
/// Hidden entries and partial downloads are left out.
fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if name.starts_with('.') || name.ends_with(PARTIAL_SUFFIX) {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Normalizes a key prefix to the `dir/` form, or `""` for the bucket root
///
/// `models/llama`, `/models/llama/` and `models/llama/` all name the same
/// directory and never match a sibling such as `models/llama-70b/`.
pub(crate) fn directory_prefix(prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}/", prefix)
    }
}

/// Joins a key prefix and a relative path with `/` separators
fn object_key(prefix: &str, relative: &Path) -> String {
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    format!("{}{}", directory_prefix(prefix), relative)
}
