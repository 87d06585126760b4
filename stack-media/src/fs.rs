use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use tracing::debug;

use crate::path::split_scheme;
use crate::{MediaError, MediaResult, MediaStat, OpenMode, Report, SchemeRegistry, StreamWrapper};

const READ_CHUNK: usize = 64 * 1024;

/// Path-based file operations over every registered virtual scheme.
///
/// Each call resolves the scheme of its path through the registry and works
/// on a fresh [`StreamWrapper`], so calls never share a handle.
#[derive(Debug, Clone)]
pub struct MediaFs {
    registry: Arc<SchemeRegistry>,
}

impl MediaFs {
    pub fn new(registry: Arc<SchemeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SchemeRegistry> {
        &self.registry
    }

    fn wrapper(&self, path: &str) -> MediaResult<StreamWrapper> {
        let (scheme, _) = split_scheme(path).ok_or_else(|| {
            MediaError::configuration(format!("{:?} is not a virtual media path", path))
        })?;
        self.registry.wrapper(scheme)
    }

    /// Open `path` with an fopen mode string (`r`, `w+`, `a`, ...).
    pub fn open(&self, path: &str, mode: &str) -> MediaResult<MediaFile> {
        let mode: OpenMode = mode.parse()?;
        let mut wrapper = self.wrapper(path)?;
        wrapper.open(path, mode, Report::Warn)?;
        Ok(MediaFile {
            wrapper,
            path: path.to_string(),
        })
    }

    /// Whole contents of `path`
    pub fn read(&self, path: &str) -> MediaResult<Vec<u8>> {
        if !self.try_is_file(path)? {
            return Err(MediaError::not_found(path));
        }
        let mut file = self.open(path, "r")?;
        let mut contents = Vec::new();
        loop {
            let chunk = file.wrapper.read(READ_CHUNK)?;
            if chunk.is_empty() {
                break;
            }
            contents.extend_from_slice(&chunk);
        }
        Ok(contents)
    }

    pub fn read_to_string(&self, path: &str) -> MediaResult<String> {
        let contents = self.read(path)?;
        String::from_utf8(contents)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
    }

    /// Create or replace `path` with `contents`.
    pub fn write<C: AsRef<[u8]>>(&self, path: &str, contents: C) -> MediaResult<()> {
        let mut file = self.open(path, "w")?;
        file.wrapper.write(contents.as_ref())?;
        file.close()
    }

    pub fn metadata(&self, path: &str) -> MediaResult<MediaStat> {
        self.wrapper(path)?.url_stat(path, Report::Quiet)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.metadata(path).map(|stat| stat.is_file()).unwrap_or(false)
    }

    /// Like [`is_file`](Self::is_file), but only absence reads as `false`.
    /// Backend and scheme failures are returned.
    pub fn try_is_file(&self, path: &str) -> MediaResult<bool> {
        match self.metadata(path) {
            Ok(stat) => Ok(stat.is_file()),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.metadata(path).map(|stat| stat.is_dir()).unwrap_or(false)
    }

    pub fn remove_file(&self, path: &str) -> MediaResult<()> {
        self.wrapper(path)?.unlink(path, Report::Warn)
    }

    /// Rename within one scheme; across schemes the object is copied then
    /// removed. Neither is atomic.
    pub fn rename(&self, from: &str, to: &str) -> MediaResult<()> {
        let mut wrapper = self.wrapper(from)?;
        let same_scheme = split_scheme(from).map(|(s, _)| s) == split_scheme(to).map(|(s, _)| s);
        if same_scheme {
            return wrapper.try_rename(from, to);
        }

        self.copy(from, to, true)?;
        wrapper.unlink(from, Report::Warn)
    }

    /// Copy `src` to `dst`. Fails with `AlreadyExists` when `dst` is a file
    /// and `overwrite` is false.
    pub fn copy(&self, src: &str, dst: &str, overwrite: bool) -> MediaResult<()> {
        if !overwrite && self.try_is_file(dst)? {
            return Err(MediaError::AlreadyExists {
                path: dst.to_string(),
            });
        }
        let contents = self.read(src)?;
        self.write(dst, contents)?;
        debug!(src, dst, "copied");
        Ok(())
    }

    /// Move `src` to `dst`, falling back to copy and delete when the rename
    /// does not go through.
    pub fn move_file(&self, src: &str, dst: &str, overwrite: bool) -> MediaResult<()> {
        if src == dst {
            return Ok(());
        }
        if !overwrite && self.try_is_file(dst)? {
            return Err(MediaError::AlreadyExists {
                path: dst.to_string(),
            });
        }

        match self.rename(src, dst) {
            Ok(()) => Ok(()),
            Err(err) => {
                if !self.try_is_file(src)? {
                    return Err(err);
                }
                debug!(src, dst, %err, "rename failed, copying instead");
                self.copy(src, dst, true)?;
                self.remove_file(src)
            }
        }
    }

    /// Directories exist implicitly, this only validates the scheme.
    pub fn create_dir_all(&self, path: &str) -> MediaResult<()> {
        self.wrapper(path)?.mkdir(path);
        Ok(())
    }

    /// Entries of a directory. Listings are always empty.
    pub fn read_dir(&self, path: &str) -> MediaResult<Vec<String>> {
        let mut wrapper = self.wrapper(path)?;
        if !wrapper.open_dir(path) {
            return Err(MediaError::NotADirectory {
                path: path.to_string(),
            });
        }

        let mut entries = Vec::new();
        while let Some(entry) = wrapper.read_dir() {
            entries.push(entry);
        }
        wrapper.close_dir();
        Ok(entries)
    }
}

/// An open virtual file.
///
/// Implements the std I/O traits. Dropping it flushes pending writes; use
/// [`close`](MediaFile::close) to observe a failed flush.
#[derive(Debug)]
pub struct MediaFile {
    wrapper: StreamWrapper,
    path: String,
}

impl MediaFile {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn metadata(&self) -> MediaResult<MediaStat> {
        self.wrapper.fstat()
    }

    pub fn is_eof(&self) -> MediaResult<bool> {
        self.wrapper.eof()
    }

    /// Flush and release the handle.
    pub fn close(mut self) -> MediaResult<()> {
        self.wrapper.try_close()
    }
}

impl Read for MediaFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.wrapper.read(buf.len())?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for MediaFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.wrapper.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.wrapper.try_flush()?)
    }
}

impl Seek for MediaFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.wrapper.seek(pos)?)
    }
}
