use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{BlobError, BlobKey, BlobMetadata, BlobResult, BlobStore};

/// BlobStore backed by a directory on the local filesystem.
///
/// Keys map to paths under `root`:
///   key "wp-content/uploads/2024/01/cat.jpg" → `{root}/wp-content/uploads/2024/01/cat.jpg`
///
/// Missing parent directories are created on `set`. Contents are written to a
/// temporary file next to the target and persisted over it, so a failed write
/// never leaves a truncated object behind.
#[derive(Debug, Clone)]
pub struct LocalFilesystemStore {
    root: PathBuf,
}

impl LocalFilesystemStore {
    /// Create a store rooted at `root`. The directory itself is created lazily.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a filesystem path. Rejects keys that escape the root.
    fn resolve(&self, key: &BlobKey) -> BlobResult<PathBuf> {
        if key.is_empty() {
            return Err(BlobError::invalid("empty blob key"));
        }
        if key.escapes_root() {
            return Err(BlobError::invalid(format!(
                "path traversal detected in key: {:?}",
                key.as_str()
            )));
        }

        Ok(key.segments().fold(self.root.clone(), |path, s| path.join(s)))
    }
}

impl BlobStore for LocalFilesystemStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
        let path = self.resolve(key)?;
        debug!("get {}", path.display());

        if path.is_dir() {
            return Err(BlobError::not_found(key.as_str()));
        }
        fs::read(&path).map_err(|e| BlobError::from_io(key.as_str(), e))
    }

    fn stat(&self, key: &BlobKey) -> BlobResult<BlobMetadata> {
        let path = self.resolve(key)?;
        debug!("stat {}", path.display());

        let meta = fs::metadata(&path).map_err(|e| BlobError::from_io(key.as_str(), e))?;
        if !meta.is_file() {
            return Err(BlobError::not_found(key.as_str()));
        }

        let modified_at = to_utc(meta.modified().ok()).unwrap_or_else(Utc::now);
        Ok(BlobMetadata {
            size: meta.len(),
            created_at: to_utc(meta.created().ok()).unwrap_or(modified_at),
            modified_at,
            accessed_at: to_utc(meta.accessed().ok()).unwrap_or(modified_at),
        })
    }

    fn set(&self, key: &BlobKey, content: &[u8]) -> BlobResult<()> {
        let path = self.resolve(key)?;
        let dir = path
            .parent()
            .ok_or_else(|| BlobError::invalid(format!("blob key has no parent: {}", key)))?;
        debug!("set {} ({} bytes)", path.display(), content.len());

        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| BlobError::from(e.error))?;

        Ok(())
    }

    fn remove(&self, key: &BlobKey) -> BlobResult<()> {
        let path = self.resolve(key)?;
        debug!("remove {}", path.display());

        fs::remove_file(&path).map_err(|e| BlobError::from_io(key.as_str(), e))
    }
}

fn to_utc(time: Option<SystemTime>) -> Option<DateTime<Utc>> {
    time.map(DateTime::<Utc>::from)
}
