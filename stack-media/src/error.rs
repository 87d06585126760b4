use stack_blob::BlobError;
use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors surfaced by the virtual media scheme
#[derive(Error, Debug)]
pub enum MediaError {
    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error("No such file: {path}")]
    NotFound { path: String },

    #[error("Invalid media configuration: {message}")]
    Configuration { message: String },

    #[error("Scheme is not registered: {scheme}://")]
    SchemeNotRegistered { scheme: String },

    #[error("Stream is not open")]
    NotOpen,

    #[error("Stream is already open on {path}")]
    AlreadyOpen { path: String },

    #[error("Stream for {path} was opened read-only")]
    ReadOnly { path: String },

    #[error("File already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Invalid seek to {target} (buffer is {len} bytes)")]
    InvalidSeek { target: i128, len: u64 },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    #[error("Invalid open mode: {mode:?}")]
    InvalidMode { mode: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not found error for a virtual path
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Map a blob error for `path`, keeping absence distinct
    pub fn from_blob(path: &str, error: BlobError) -> Self {
        if error.is_not_found() {
            Self::not_found(path)
        } else {
            Self::Blob(error)
        }
    }

    /// True when the error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Blob(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// True for errors caused by using a stream in the wrong state
    pub fn is_protocol_misuse(&self) -> bool {
        matches!(
            self,
            Self::NotOpen | Self::AlreadyOpen { .. } | Self::ReadOnly { .. }
        )
    }
}

impl From<MediaError> for std::io::Error {
    fn from(err: MediaError) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            MediaError::Io(io) => io.kind(),
            e if e.is_not_found() => ErrorKind::NotFound,
            MediaError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            MediaError::ReadOnly { .. } => ErrorKind::PermissionDenied,
            MediaError::InvalidSeek { .. } | MediaError::InvalidMode { .. } => {
                ErrorKind::InvalidInput
            }
            MediaError::Unsupported { .. } => ErrorKind::Unsupported,
            _ => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
