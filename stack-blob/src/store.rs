use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlobKey, BlobResult};

/// Core blob storage operations - must be implemented by all storage backends
///
/// Every call blocks the calling thread until the backend answers. Absent
/// objects are reported as [`BlobError::NotFound`](crate::BlobError::NotFound)
/// so callers can tell "create it" apart from a genuine failure.
pub trait BlobStore: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Fetch the full contents of a blob
    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>>;

    /// Get blob metadata without content where the backend allows it
    fn stat(&self, key: &BlobKey) -> BlobResult<BlobMetadata>;

    /// Create or fully overwrite a blob
    fn set(&self, key: &BlobKey, content: &[u8]) -> BlobResult<()>;

    /// Delete a blob
    fn remove(&self, key: &BlobKey) -> BlobResult<()>;
}

/// Metadata about a blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
}

impl BlobMetadata {
    /// Metadata for backends that only track one timestamp.
    pub fn uniform(size: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            size,
            created_at: modified_at,
            modified_at,
            accessed_at: modified_at,
        }
    }
}
