use std::fmt;
use std::io::{Cursor, SeekFrom, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use stack_blob::{BlobKey, BlobResult, BlobStore};
use tracing::{debug, warn};

use crate::path::{self, to_key};
use crate::{MediaError, MediaResult, MediaStat, OpenMode};

/// Default virtual scheme
pub const DEFAULT_SCHEME: &str = "media";

/// Whether a failure should also emit a warning diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Report {
    #[default]
    Warn,
    Quiet,
}

/// A metadata change requested through the virtual scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataChange {
    Touch {
        modified: Option<DateTime<Utc>>,
        accessed: Option<DateTime<Utc>>,
    },
    Owner(u32),
    Group(u32),
    Permissions(u32),
}

impl MetadataChange {
    fn operation(&self) -> &'static str {
        match self {
            Self::Touch { .. } => "touch",
            Self::Owner(_) => "chown",
            Self::Group(_) => "chgrp",
            Self::Permissions(_) => "chmod",
        }
    }
}

/// One in-flight read/write session against a blob
struct OpenStream {
    key: BlobKey,
    buffer: Cursor<Vec<u8>>,
    mode: OpenMode,
    dirty: bool,
}

impl OpenStream {
    fn len(&self) -> u64 {
        self.buffer.get_ref().len() as u64
    }
}

enum Handle {
    Closed,
    File(OpenStream),
    Dir { key: String },
}

/// Byte-stream and directory emulation over a [`BlobStore`].
///
/// The whole object is staged in memory on [`open`](Self::open); reads,
/// writes and seeks work on that buffer and only [`flush`](Self::flush) and
/// [`close`](Self::close) talk to the store again.
///
/// One wrapper holds at most one handle at a time. Use separate wrappers for
/// concurrent access. Dropping a wrapper closes (and flushes) its stream.
pub struct StreamWrapper {
    scheme: String,
    store: Arc<dyn BlobStore>,
    handle: Handle,
}

impl StreamWrapper {
    pub fn new<S: Into<String>>(scheme: S, store: Arc<dyn BlobStore>) -> Self {
        Self {
            scheme: scheme.into(),
            store,
            handle: Handle::Closed,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// True while a file stream is open
    pub fn is_open(&self) -> bool {
        matches!(self.handle, Handle::File(_))
    }

    /// Key of the open file stream
    pub fn key(&self) -> Option<&BlobKey> {
        match &self.handle {
            Handle::File(stream) => Some(&stream.key),
            _ => None,
        }
    }

    fn key_for(&self, path: &str) -> BlobKey {
        to_key(path, &self.scheme)
    }

    fn report(&self, report: Report, message: fmt::Arguments<'_>) {
        if report == Report::Warn {
            warn!(scheme = %self.scheme, "{}", message);
        }
    }

    fn stream(&self) -> MediaResult<&OpenStream> {
        match &self.handle {
            Handle::File(stream) => Ok(stream),
            _ => Err(MediaError::NotOpen),
        }
    }

    fn stream_mut(&mut self) -> MediaResult<&mut OpenStream> {
        match &mut self.handle {
            Handle::File(stream) => Ok(stream),
            _ => Err(MediaError::NotOpen),
        }
    }

    /// Open `path` and stage its contents.
    ///
    /// An absent object opens as an empty buffer, so writing then closing
    /// creates it. Any other backend failure fails the open.
    pub fn open(&mut self, path: &str, mode: OpenMode, report: Report) -> MediaResult<()> {
        match &self.handle {
            Handle::Closed => {}
            Handle::File(stream) => {
                return Err(MediaError::AlreadyOpen {
                    path: stream.key.to_string(),
                })
            }
            Handle::Dir { key } => return Err(MediaError::AlreadyOpen { path: key.clone() }),
        }

        let key = self.key_for(path);
        let existing = match self.load(&key, mode) {
            Ok(existing) => existing,
            Err(err) => {
                self.report(
                    report,
                    format_args!("open failed for {} with error: {}", key, err),
                );
                return Err(err.into());
            }
        };

        if mode.create_new && existing.is_some() {
            self.report(
                report,
                format_args!("open failed for {} with error: file exists", key),
            );
            return Err(MediaError::AlreadyExists {
                path: path::virtual_path(&self.scheme, key.as_str()),
            });
        }

        let created = existing.is_none() && mode.creates();
        let contents = existing.flatten().unwrap_or_default();
        let mut buffer = Cursor::new(contents);
        if mode.append {
            buffer.set_position(buffer.get_ref().len() as u64);
        }

        debug!(scheme = %self.scheme, %key, %mode, "open");
        self.handle = Handle::File(OpenStream {
            key,
            buffer,
            mode,
            dirty: mode.truncate || created,
        });
        Ok(())
    }

    /// `None` when the object is absent. `Some(None)` when it exists but the
    /// mode does not need its bytes.
    fn load(&self, key: &BlobKey, mode: OpenMode) -> BlobResult<Option<Option<Vec<u8>>>> {
        let found = if mode.loads_contents() {
            self.store.get(key).map(Some)
        } else if mode.create_new {
            self.store.stat(key).map(|_| None)
        } else {
            // truncating: the old contents are never needed
            return Ok(Some(None));
        };

        match found {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Read up to `count` bytes from the current position.
    ///
    /// Returns an empty vector at end of stream.
    pub fn read(&mut self, count: usize) -> MediaResult<Vec<u8>> {
        let stream = self.stream_mut()?;
        let len = stream.len();
        let pos = stream.buffer.position();
        if pos >= len {
            return Ok(Vec::new());
        }

        let start = pos as usize;
        let end = start.saturating_add(count).min(len as usize);
        let chunk = stream.buffer.get_ref()[start..end].to_vec();
        stream.buffer.set_position(end as u64);
        Ok(chunk)
    }

    /// Write `data` at the current position (always at the end in append mode).
    ///
    /// Writing past the end fills the gap with zeroes.
    pub fn write(&mut self, data: &[u8]) -> MediaResult<usize> {
        let stream = self.stream_mut()?;
        if !stream.mode.write {
            return Err(MediaError::ReadOnly {
                path: stream.key.to_string(),
            });
        }
        if data.is_empty() {
            return Ok(0);
        }

        if stream.mode.append {
            let end = stream.len();
            stream.buffer.set_position(end);
        }
        stream.buffer.write_all(data)?;
        stream.dirty = true;
        Ok(data.len())
    }

    /// Move the cursor. Negative targets are rejected; targets past the end
    /// are allowed.
    pub fn seek(&mut self, pos: SeekFrom) -> MediaResult<u64> {
        let stream = self.stream_mut()?;
        let len = stream.len();
        let target: i128 = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => stream.buffer.position() as i128 + delta as i128,
            SeekFrom::End(delta) => len as i128 + delta as i128,
        };

        let position = u64::try_from(target).map_err(|_| MediaError::InvalidSeek { target, len })?;
        stream.buffer.set_position(position);
        Ok(position)
    }

    /// Current cursor position
    pub fn tell(&self) -> MediaResult<u64> {
        Ok(self.stream()?.buffer.position())
    }

    /// True once the cursor is at or past the end of the buffer
    pub fn eof(&self) -> MediaResult<bool> {
        let stream = self.stream()?;
        Ok(stream.buffer.position() >= stream.len())
    }

    /// Stat of the open handle
    pub fn fstat(&self) -> MediaResult<MediaStat> {
        Ok(MediaStat::buffer(self.stream()?.len()))
    }

    /// Push dirty contents back to the store.
    pub fn try_flush(&mut self) -> MediaResult<()> {
        let store = Arc::clone(&self.store);
        let stream = self.stream_mut()?;
        if !stream.dirty {
            return Ok(());
        }

        store.set(&stream.key, stream.buffer.get_ref())?;
        stream.dirty = false;
        debug!(key = %stream.key, "flushed");
        Ok(())
    }

    /// Best-effort flush: `false` when nothing is open or the store refused
    /// the write. The stream stays open either way.
    pub fn flush(&mut self, report: Report) -> bool {
        match self.try_flush() {
            Ok(()) => true,
            Err(MediaError::NotOpen) => false,
            Err(err) => {
                self.report(report, format_args!("flush failed with error: {}", err));
                false
            }
        }
    }

    /// Flush if dirty, then release the handle.
    ///
    /// The handle is released even when the flush fails; the error is
    /// returned. Closing a closed wrapper is a no-op.
    pub fn try_close(&mut self) -> MediaResult<()> {
        let result = match self.handle {
            Handle::File(_) => self.try_flush(),
            _ => Ok(()),
        };
        self.handle = Handle::Closed;
        result
    }

    /// [`try_close`](Self::try_close) reporting failure as `false`
    pub fn close(&mut self, report: Report) -> bool {
        match self.try_close() {
            Ok(()) => true,
            Err(err) => {
                self.report(report, format_args!("close failed with error: {}", err));
                false
            }
        }
    }

    /// Stat a virtual path.
    ///
    /// Paths without an extension are directories and get a fixed record
    /// without consulting the store.
    pub fn url_stat(&self, path: &str, report: Report) -> MediaResult<MediaStat> {
        if path::is_dir(path, &self.scheme) {
            return Ok(MediaStat::directory());
        }

        let key = self.key_for(path);
        match self.store.stat(&key) {
            Ok(meta) => Ok(MediaStat::file(&meta)),
            Err(err) if err.is_not_found() => Err(MediaError::not_found(path)),
            Err(err) => {
                self.report(
                    report,
                    format_args!("url_stat failed for {} with error: {}", key, err),
                );
                Err(err.into())
            }
        }
    }

    /// Delete the object behind `path`.
    ///
    /// If that object is the one open on this wrapper, the open stream is
    /// discarded without flushing.
    pub fn unlink(&mut self, path: &str, report: Report) -> MediaResult<()> {
        let key = self.key_for(path);
        if let Err(err) = self.store.remove(&key) {
            self.report(
                report,
                format_args!("unlink failed for {} with error: {}", key, err),
            );
            return Err(MediaError::from_blob(path, err));
        }

        if self.key() == Some(&key) {
            self.handle = Handle::Closed;
        }
        debug!(scheme = %self.scheme, %key, "unlinked");
        Ok(())
    }

    /// Copy `from` to `to`, then remove `from`.
    ///
    /// Not atomic: a failure after the copy leaves both objects in place.
    pub fn try_rename(&mut self, from: &str, to: &str) -> MediaResult<()> {
        if from == to {
            return Ok(());
        }

        let source = self.key_for(from);
        let target = self.key_for(to);
        if source == target {
            return Ok(());
        }

        let contents = self
            .store
            .get(&source)
            .map_err(|err| MediaError::from_blob(from, err))?;
        self.store.set(&target, &contents)?;
        self.store
            .remove(&source)
            .map_err(|err| MediaError::from_blob(from, err))?;

        debug!(scheme = %self.scheme, from = %source, to = %target, "renamed");
        Ok(())
    }

    /// [`try_rename`](Self::try_rename) reporting failure as `false`
    pub fn rename(&mut self, from: &str, to: &str, report: Report) -> bool {
        match self.try_rename(from, to) {
            Ok(()) => true,
            Err(err) => {
                self.report(
                    report,
                    format_args!("rename from {} to {} failed with error: {}", from, to, err),
                );
                false
            }
        }
    }

    /// Directories exist implicitly; nothing to create.
    pub fn mkdir(&self, path: &str) -> bool {
        debug!(scheme = %self.scheme, path, "mkdir (implicit)");
        true
    }

    /// Open a directory handle. Only directory-shaped paths succeed.
    pub fn open_dir(&mut self, path: &str) -> bool {
        if !matches!(self.handle, Handle::Closed) || !path::is_dir(path, &self.scheme) {
            return false;
        }
        self.handle = Handle::Dir {
            key: self.key_for(path).to_string(),
        };
        true
    }

    /// Next directory entry. Listings are always empty.
    pub fn read_dir(&mut self) -> Option<String> {
        None
    }

    pub fn rewind_dir(&mut self) -> bool {
        matches!(self.handle, Handle::Dir { .. })
    }

    pub fn close_dir(&mut self) -> bool {
        if matches!(self.handle, Handle::Dir { .. }) {
            self.handle = Handle::Closed;
            true
        } else {
            false
        }
    }

    /// Always fails: blobs carry no settable metadata.
    pub fn set_metadata(&self, path: &str, change: MetadataChange) -> MediaResult<()> {
        debug!(scheme = %self.scheme, path, ?change, "metadata change refused");
        Err(MediaError::Unsupported {
            operation: change.operation(),
        })
    }
}

impl Drop for StreamWrapper {
    fn drop(&mut self) {
        if self.is_open() {
            self.close(Report::Warn);
        }
    }
}

impl fmt::Debug for StreamWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.handle {
            Handle::Closed => "closed".to_string(),
            Handle::File(stream) => format!("file {} ({})", stream.key, stream.mode),
            Handle::Dir { key } => format!("dir {}", key),
        };
        f.debug_struct("StreamWrapper")
            .field("scheme", &self.scheme)
            .field("store", &self.store.name())
            .field("handle", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stack_blob::{BlobError, BlobMetadata, ObjectCacheStore};

    fn create_test_wrapper() -> (Arc<dyn BlobStore>, StreamWrapper) {
        let store: Arc<dyn BlobStore> = Arc::new(ObjectCacheStore::in_memory());
        let wrapper = StreamWrapper::new(DEFAULT_SCHEME, Arc::clone(&store));
        (store, wrapper)
    }

    fn mode(s: &str) -> OpenMode {
        s.parse().unwrap()
    }

    /// A store whose writes always fail
    struct RefusingStore;

    impl BlobStore for RefusingStore {
        fn name(&self) -> &'static str {
            "refusing"
        }

        fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
            Err(BlobError::not_found(key.as_str()))
        }

        fn stat(&self, key: &BlobKey) -> BlobResult<BlobMetadata> {
            Err(BlobError::not_found(key.as_str()))
        }

        fn set(&self, _key: &BlobKey, _content: &[u8]) -> BlobResult<()> {
            Err(BlobError::invalid("read-only backend"))
        }

        fn remove(&self, key: &BlobKey) -> BlobResult<()> {
            Err(BlobError::not_found(key.as_str()))
        }
    }

    #[test]
    fn test_read_in_chunks_until_eof() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a.txt"), b"hello world").unwrap();

        wrapper.open("media://a.txt", mode("r"), Report::Warn).unwrap();
        assert_eq!(wrapper.read(5).unwrap(), b"hello");
        assert_eq!(wrapper.tell().unwrap(), 5);
        assert!(!wrapper.eof().unwrap());
        assert_eq!(wrapper.read(100).unwrap(), b" world");
        assert!(wrapper.eof().unwrap());
        assert!(wrapper.read(1).unwrap().is_empty());
    }

    #[test]
    fn test_write_on_read_only_stream() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a.txt"), b"hello").unwrap();

        wrapper.open("media://a.txt", mode("r"), Report::Quiet).unwrap();
        assert!(matches!(
            wrapper.write(b"x"),
            Err(MediaError::ReadOnly { .. })
        ));
        assert!(wrapper.close(Report::Quiet));
        assert_eq!(store.get(&BlobKey::new("a.txt")).unwrap(), b"hello");
    }

    #[test]
    fn test_operations_on_closed_stream() {
        let (_store, mut wrapper) = create_test_wrapper();

        assert!(matches!(wrapper.read(1), Err(MediaError::NotOpen)));
        assert!(matches!(wrapper.write(b"x"), Err(MediaError::NotOpen)));
        assert!(matches!(wrapper.seek(SeekFrom::Start(0)), Err(MediaError::NotOpen)));
        assert!(matches!(wrapper.tell(), Err(MediaError::NotOpen)));
        assert!(!wrapper.flush(Report::Quiet));
        assert!(wrapper.close(Report::Quiet));
    }

    #[test]
    fn test_open_twice_is_rejected() {
        let (_store, mut wrapper) = create_test_wrapper();
        wrapper.open("media://a.txt", mode("w"), Report::Warn).unwrap();

        let err = wrapper
            .open("media://b.txt", mode("w"), Report::Warn)
            .unwrap_err();
        assert!(err.is_protocol_misuse());
        assert_eq!(wrapper.key().unwrap().as_str(), "a.txt");
    }

    #[test]
    fn test_write_mode_truncates() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a.txt"), b"old contents").unwrap();

        wrapper.open("media://a.txt", mode("w"), Report::Warn).unwrap();
        wrapper.write(b"new").unwrap();
        assert!(wrapper.close(Report::Warn));

        assert_eq!(store.get(&BlobKey::new("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_open_and_close_creates_empty_object() {
        let (store, mut wrapper) = create_test_wrapper();

        wrapper.open("media://empty.txt", mode("w"), Report::Warn).unwrap();
        assert!(wrapper.close(Report::Warn));

        assert!(store.get(&BlobKey::new("empty.txt")).unwrap().is_empty());
    }

    #[test]
    fn test_read_mode_does_not_create() {
        let (store, mut wrapper) = create_test_wrapper();

        wrapper.open("media://missing.txt", mode("r"), Report::Warn).unwrap();
        assert!(wrapper.read(10).unwrap().is_empty());
        assert!(wrapper.close(Report::Warn));

        assert!(store
            .get(&BlobKey::new("missing.txt"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_append_writes_at_end() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("log.txt"), b"one\n").unwrap();

        wrapper.open("media://log.txt", mode("a+"), Report::Warn).unwrap();
        wrapper.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(wrapper.read(3).unwrap(), b"one");
        wrapper.write(b"two\n").unwrap();
        assert!(wrapper.close(Report::Warn));

        assert_eq!(store.get(&BlobKey::new("log.txt")).unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn test_exclusive_create() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("taken.txt"), b"x").unwrap();

        assert!(matches!(
            wrapper.open("media://taken.txt", mode("x"), Report::Warn),
            Err(MediaError::AlreadyExists { ref path }) if path == "media://taken.txt"
        ));
        assert!(!wrapper.is_open());

        wrapper.open("media://fresh.txt", mode("x"), Report::Warn).unwrap();
        wrapper.write(b"y").unwrap();
        assert!(wrapper.close(Report::Warn));
        assert_eq!(store.get(&BlobKey::new("fresh.txt")).unwrap(), b"y");
    }

    #[test]
    fn test_seek_overwrite_and_gap() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a.bin"), b"abcdef").unwrap();

        wrapper.open("media://a.bin", mode("r+"), Report::Warn).unwrap();
        assert_eq!(wrapper.seek(SeekFrom::End(-2)).unwrap(), 4);
        wrapper.write(b"XY").unwrap();
        assert_eq!(wrapper.seek(SeekFrom::Current(2)).unwrap(), 8);
        wrapper.write(b"Z").unwrap();
        assert!(wrapper.close(Report::Warn));

        assert_eq!(
            store.get(&BlobKey::new("a.bin")).unwrap(),
            b"abcdXY\0\0Z"
        );
    }

    #[test]
    fn test_negative_seek_is_rejected() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a.bin"), b"abc").unwrap();

        wrapper.open("media://a.bin", mode("r"), Report::Warn).unwrap();
        wrapper.seek(SeekFrom::Start(2)).unwrap();
        assert!(matches!(
            wrapper.seek(SeekFrom::Current(-3)),
            Err(MediaError::InvalidSeek { target: -1, len: 3 })
        ));
        assert_eq!(wrapper.tell().unwrap(), 2);
    }

    #[test]
    fn test_flush_keeps_stream_open() {
        let (store, mut wrapper) = create_test_wrapper();
        let key = BlobKey::new("a.txt");

        wrapper.open("media://a.txt", mode("w+"), Report::Warn).unwrap();
        wrapper.write(b"first").unwrap();
        assert!(wrapper.flush(Report::Warn));
        assert_eq!(store.get(&key).unwrap(), b"first");

        assert!(wrapper.is_open());
        wrapper.write(b" second").unwrap();
        assert!(wrapper.close(Report::Warn));
        assert_eq!(store.get(&key).unwrap(), b"first second");
    }

    #[test]
    fn test_flush_failure_is_false() {
        let mut wrapper = StreamWrapper::new(DEFAULT_SCHEME, Arc::new(RefusingStore));

        wrapper.open("media://a.txt", mode("w"), Report::Quiet).unwrap();
        wrapper.write(b"data").unwrap();
        assert!(!wrapper.flush(Report::Quiet));
        assert!(wrapper.is_open());

        assert!(!wrapper.close(Report::Quiet));
        assert!(!wrapper.is_open());
    }

    #[test]
    fn test_drop_flushes_dirty_stream() {
        let (store, mut wrapper) = create_test_wrapper();
        wrapper.open("media://dropped.txt", mode("w"), Report::Warn).unwrap();
        wrapper.write(b"kept").unwrap();
        drop(wrapper);

        assert_eq!(store.get(&BlobKey::new("dropped.txt")).unwrap(), b"kept");
    }

    #[test]
    fn test_fstat_reports_buffer_size() {
        let (_store, mut wrapper) = create_test_wrapper();
        wrapper.open("media://a.txt", mode("w"), Report::Warn).unwrap();
        wrapper.write(b"12345").unwrap();

        let stat = wrapper.fstat().unwrap();
        assert!(stat.is_file());
        assert_eq!(stat.size, 5);
    }

    #[test]
    fn test_url_stat() {
        let (store, wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a/b/c.txt"), b"hello").unwrap();

        let stat = wrapper.url_stat("media://a/b/c.txt", Report::Warn).unwrap();
        assert_eq!(stat.mode, crate::FILE_WRITABLE_MODE);
        assert_eq!(stat.size, 5);
        assert_eq!(stat.atime, stat.mtime);

        // no object behind it, still a directory
        let stat = wrapper.url_stat("media://a/nothing/here", Report::Warn).unwrap();
        assert_eq!(stat, MediaStat::directory());

        assert!(wrapper
            .url_stat("media://a/missing.txt", Report::Quiet)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_unlink_discards_open_stream() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("a.txt"), b"hello").unwrap();

        wrapper.open("media://a.txt", mode("r+"), Report::Warn).unwrap();
        wrapper.write(b"changed").unwrap();
        wrapper.unlink("media://a.txt", Report::Warn).unwrap();

        assert!(!wrapper.is_open());
        assert!(store.get(&BlobKey::new("a.txt")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unlink_missing() {
        let (_store, mut wrapper) = create_test_wrapper();
        let err = wrapper
            .unlink("media://missing.txt", Report::Quiet)
            .unwrap_err();
        assert!(matches!(err, MediaError::NotFound { ref path } if path == "media://missing.txt"));
    }

    #[test]
    fn test_rename() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("from.txt"), b"payload").unwrap();

        assert!(wrapper.rename("media://from.txt", "media://to/here.txt", Report::Warn));

        assert_eq!(store.get(&BlobKey::new("to/here.txt")).unwrap(), b"payload");
        assert!(store.get(&BlobKey::new("from.txt")).unwrap_err().is_not_found());

        assert!(wrapper.rename("media://same.txt", "media://same.txt", Report::Warn));
        assert!(!wrapper.rename("media://gone.txt", "media://x.txt", Report::Quiet));
    }

    #[test]
    fn test_directory_handle() {
        let (_store, mut wrapper) = create_test_wrapper();
        assert!(wrapper.mkdir("media://wp-content/uploads/2024"));

        assert!(!wrapper.open_dir("media://wp-content/uploads/a.jpg"));
        assert!(!wrapper.rewind_dir());

        assert!(wrapper.open_dir("media://wp-content/uploads"));
        assert_eq!(wrapper.read_dir(), None);
        assert!(wrapper.rewind_dir());
        assert!(wrapper.close_dir());
        assert!(!wrapper.close_dir());
    }

    #[test]
    fn test_set_metadata_unsupported() {
        let (_store, wrapper) = create_test_wrapper();
        let err = wrapper
            .set_metadata(
                "media://a.txt",
                MetadataChange::Touch {
                    modified: None,
                    accessed: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, MediaError::Unsupported { operation: "touch" }));
    }

    struct WarnCounter(Arc<std::sync::atomic::AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }
    }

    fn count_warnings<F: FnOnce()>(f: F) -> usize {
        use tracing_subscriber::layer::SubscriberExt;

        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
        tracing::subscriber::with_default(subscriber, f);
        count.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[test]
    fn test_exclusive_create_conflict_is_reported() {
        let (store, mut wrapper) = create_test_wrapper();
        store.set(&BlobKey::new("taken.txt"), b"x").unwrap();

        let quiet = count_warnings(|| {
            let err = wrapper
                .open("media://taken.txt", mode("x"), Report::Quiet)
                .unwrap_err();
            assert!(matches!(err, MediaError::AlreadyExists { .. }));
        });
        assert_eq!(quiet, 0);

        let warned = count_warnings(|| {
            let err = wrapper
                .open("media://taken.txt", mode("x+"), Report::Warn)
                .unwrap_err();
            assert!(matches!(err, MediaError::AlreadyExists { .. }));
        });
        assert_eq!(warned, 1);
        assert!(!wrapper.is_open());
    }
}
