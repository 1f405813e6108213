use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;

/// Reference data the worker reads. Their absence is an operator problem,
/// not a per-upload validation error, and is checked before any worker is
/// launched.
pub const REQUIRED_DATA_FILES: &[&str] = &["linkdindata.csv", "skills.csv"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write upload: {0}")]
    Write(#[source] std::io::Error),
}

/// Request-scoped persistence for uploaded documents.
///
/// Carried in `AppState` as `Arc<dyn UploadStore>` so tests can substitute
/// an instrumented store and assert the one-release-per-store invariant.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Persists the payload under a name that cannot collide across
    /// concurrent requests and returns the full path.
    async fn store(&self, data: &[u8], original_name: &str) -> Result<PathBuf, StorageError>;

    /// Best-effort, idempotent deletion. Failures are logged, never raised:
    /// cleanup must not mask the outcome already computed.
    async fn release(&self, path: &Path);
}

/// Stores uploads as plain files under a single root directory.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Creates the storage root if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("cannot create upload directory {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl UploadStore for DiskStore {
    async fn store(&self, data: &[u8], original_name: &str) -> Result<PathBuf, StorageError> {
        let storage_name = format!("{}-{}", Uuid::new_v4(), sanitize_name(original_name));
        let path = self.root.join(storage_name);
        tokio::fs::write(&path, data)
            .await
            .map_err(StorageError::Write)?;
        debug!(path = %path.display(), bytes = data.len(), "stored upload");
        Ok(path)
    }

    async fn release(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "released upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to delete upload"),
        }
    }
}

/// Reduces an untrusted client filename to its final component, dropping
/// any path structure. An empty result falls back to a fixed name.
fn sanitize_name(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if name.is_empty() {
        "resume.pdf".to_string()
    } else {
        name.to_string()
    }
}

/// Verifies the fixed set of reference files the worker depends on.
pub fn check_reference_data(data_dir: &Path) -> Result<(), AppError> {
    for file in REQUIRED_DATA_FILES {
        if !data_dir.join(file).is_file() {
            return Err(AppError::MissingDependency(file.to_string()));
        }
    }
    Ok(())
}
