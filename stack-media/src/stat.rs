use chrono::{DateTime, Utc};
use serde::Serialize;
use stack_blob::BlobMetadata;

/// `S_IFREG | 0666`
pub const FILE_WRITABLE_MODE: u32 = 0o100666;

/// `S_IFDIR | 0777`
pub const DIRECTORY_WRITABLE_MODE: u32 = 0o40777;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

/// stat(2)-style record for a virtual path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaStat {
    pub mode: u32,
    pub size: u64,
    /// Seconds since the Unix epoch
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

impl MediaStat {
    /// The synthetic record reported for every directory
    pub fn directory() -> Self {
        Self {
            mode: DIRECTORY_WRITABLE_MODE,
            size: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
        }
    }

    /// A writable file. All three timestamps come from the modification time,
    /// as most backends track nothing else.
    pub fn file(meta: &BlobMetadata) -> Self {
        let mtime = meta.modified_at.timestamp();
        Self {
            mode: FILE_WRITABLE_MODE,
            size: meta.size,
            atime: mtime,
            mtime,
            ctime: mtime,
        }
    }

    /// Stat of an open, not yet flushed buffer
    pub fn buffer(size: u64) -> Self {
        Self {
            mode: FILE_WRITABLE_MODE,
            size,
            atime: 0,
            mtime: 0,
            ctime: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Modification time, when the backend reported one
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        if self.mtime == 0 {
            return None;
        }
        DateTime::from_timestamp(self.mtime, 0)
    }
}
