//! Filesystem contract and in-memory virtual file tree.
//!
//! [`FileSystem`] is the path-based contract every backing implementation
//! fulfils; [`StorageFile`] and [`StorageFolder`] are the handles callers
//! usually work with. [`InMemoryFileSystem`] is the implementation that
//! ships: a single-process tree whose nodes and contents vanish with the
//! instance. Nothing is persisted.
//!
//! # Example
//!
//! ```
//! use stowage_types::CreationCollisionOption;
//! use stowage_vfs::{FileSystemExt, InMemoryFileSystem};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> stowage_types::StorageResult<()> {
//! let fs = InMemoryFileSystem::new().into_shared();
//! let file = fs.file("/docs/hello.txt")?;
//! file.create(true, CreationCollisionOption::Fail).await?;
//! file.write_text("hello", None).await?;
//! assert_eq!(file.read_text(None).await?, "hello");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod handle;
pub mod known_folders;
pub mod memory;
pub mod ops;
pub mod stream;

pub use config::{ConfigError, FileSystemConfig, PathFlavor};
pub use handle::{FileSystemExt, StorageFile, StorageFolder};
pub use known_folders::{KnownFolderResolver, KnownFolderTable};
pub use memory::InMemoryFileSystem;
pub use ops::FileSystem;
pub use stream::{ContentLease, FileStream};
