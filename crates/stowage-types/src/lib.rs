//! Path algebra, options and error types for stowage.
//!
//! This crate is the lexical foundation: path conventions, the path value
//! type with its algebra, the option enums every structural operation takes,
//! and the error taxonomy. It has **no internal stowage dependencies** and
//! performs no I/O.
//!
//! # Key Types
//!
//! |-----------------------------|---------------------------------------------|
//! | Type                        | Purpose                                     |
//! |-----------------------------|---------------------------------------------|
//! | [`PathInformation`]         | Separators, special segments, invalid chars |
//! | [`StoragePath`]             | Immutable path + lexical algebra            |
//! | [`FileSystemId`]            | Which filesystem instance a path belongs to |
//! | [`CreationCollisionOption`] | Policy for `create` on an occupied path     |
//! | [`NameCollisionOption`]     | Policy for `move`/`copy`/`rename`           |
//! | [`DeletionOption`]          | Policy for `delete` on a missing element    |
//! | [`FileAccessMode`]          | Read / Write / ReadWrite content access     |
//! | [`StorageError`]            | Error taxonomy                              |
//! |-----------------------------|---------------------------------------------|

pub mod encoding;
pub mod error;
pub mod ids;
pub mod known_folder;
pub mod options;
pub mod path;
pub mod path_info;
pub mod properties;

// Re-export primary types at crate root for convenience.
pub use encoding::TextEncoding;
pub use error::{StorageError, StorageErrorKind, StorageResult};
pub use ids::FileSystemId;
pub use known_folder::KnownFolder;
pub use options::{
    CreationCollisionOption, DeletionOption, FileAccessMode, NameCollisionOption, parse_option,
};
pub use path::{PathKind, StoragePath};
pub use path_info::{PathInformation, StringComparison};
pub use properties::{ElementKind, FileAttributes, FileProperties, FolderProperties};
