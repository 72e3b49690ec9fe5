//! Storage error types.

use std::io;
use thiserror::Error;

/// Storage error type.
///
/// Every failure a filesystem operation can surface. Variants carry the path
/// (or a short message) so callers can tell which element was at fault.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The element addressed by the operation does not exist.
    #[error("not found: {0}")]
    NotFoundSelf(String),

    /// A parent folder of the addressed element does not exist.
    #[error("parent folder not found: {0}")]
    NotFoundParent(String),

    /// An element already occupies the target path.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A file was found where a folder was expected, or vice versa.
    #[error("type conflict: {0}")]
    TypeConflict(String),

    /// The file's content is held by a conflicting stream.
    #[error("in use: {0}")]
    InUse(String),

    /// Malformed path string.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Empty input, bad name, unsupported option value, foreign path.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Content could not be decoded with the requested encoding.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The operation observed a cancellation request.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error from a content stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Discriminant of a [`StorageError`], for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    NotFoundSelf,
    NotFoundParent,
    AlreadyExists,
    TypeConflict,
    InUse,
    InvalidPath,
    InvalidArgument,
    InvalidData,
    Cancelled,
    Io,
}

impl StorageError {
    /// Create a NotFoundSelf error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFoundSelf(path.into())
    }

    /// Create a NotFoundParent error.
    pub fn parent_not_found(path: impl Into<String>) -> Self {
        Self::NotFoundParent(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a TypeConflict error.
    pub fn type_conflict(msg: impl Into<String>) -> Self {
        Self::TypeConflict(msg.into())
    }

    /// Create an InUse error.
    pub fn in_use(path: impl Into<String>) -> Self {
        Self::InUse(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an InvalidData error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// The payload-free discriminant.
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            Self::NotFoundSelf(_) => StorageErrorKind::NotFoundSelf,
            Self::NotFoundParent(_) => StorageErrorKind::NotFoundParent,
            Self::AlreadyExists(_) => StorageErrorKind::AlreadyExists,
            Self::TypeConflict(_) => StorageErrorKind::TypeConflict,
            Self::InUse(_) => StorageErrorKind::InUse,
            Self::InvalidPath(_) => StorageErrorKind::InvalidPath,
            Self::InvalidArgument(_) => StorageErrorKind::InvalidArgument,
            Self::InvalidData(_) => StorageErrorKind::InvalidData,
            Self::Cancelled => StorageErrorKind::Cancelled,
            Self::Io(_) => StorageErrorKind::Io,
        }
    }

    /// True for either flavour of "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFoundSelf(_) | Self::NotFoundParent(_))
    }
}

/// Convert StorageError to std::io::Error for compatibility.
impl From<StorageError> for io::Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFoundSelf(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            StorageError::NotFoundParent(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            StorageError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            StorageError::TypeConflict(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            StorageError::InUse(msg) => io::Error::new(io::ErrorKind::ResourceBusy, msg),
            StorageError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            StorageError::InvalidArgument(msg) => {
                io::Error::new(io::ErrorKind::InvalidInput, msg)
            }
            StorageError::InvalidData(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            StorageError::Cancelled => io::Error::new(io::ErrorKind::Interrupted, "cancelled"),
            StorageError::Io(e) => e,
        }
    }
}

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;
