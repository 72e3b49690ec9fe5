//! Filesystem operations trait.
//!
//! The contract every backing implementation fulfils. Operations are
//! path-based; the [`StorageFile`](crate::StorageFile) and
//! [`StorageFolder`](crate::StorageFolder) handles are thin wrappers that pair
//! a path with a filesystem and add convenience on top.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use stowage_types::{
    CreationCollisionOption, DeletionOption, ElementKind, FileAccessMode, FileAttributes,
    FileProperties, FileSystemId, FolderProperties, KnownFolder, NameCollisionOption,
    PathInformation, StorageResult, StoragePath,
};

use crate::stream::FileStream;

/// Core filesystem operations trait.
///
/// Every path argument must have been produced by this filesystem
/// (`get_path`, or algebra on such a path); foreign paths fail with
/// `InvalidArgument`. Every operation checks `cancel` on entry.
#[async_trait]
pub trait FileSystem: Send + Sync {
    // ========================================================================
    // Identity and paths
    // ========================================================================

    /// Identity of this filesystem instance.
    fn id(&self) -> FileSystemId;

    /// Path conventions of this filesystem.
    fn path_information(&self) -> &Arc<PathInformation>;

    /// Build a path from a string, validated against the invalid characters.
    fn get_path(&self, path: &str) -> StorageResult<StoragePath> {
        StoragePath::new(self.id(), Arc::clone(self.path_information()), path)
    }

    /// Canonical path of a well-known folder. The folder is not created.
    async fn known_folder_path(&self, folder: KnownFolder) -> StorageResult<StoragePath>;

    // ========================================================================
    // Existence
    // ========================================================================

    /// True if a file exists at `path`.
    async fn file_exists(&self, path: &StoragePath, cancel: &CancellationToken)
        -> StorageResult<bool>;

    /// True if a folder exists at `path`.
    async fn folder_exists(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool>;

    // ========================================================================
    // Structure
    // ========================================================================

    /// Create an empty file.
    ///
    /// With `recursive`, missing ancestor folders are created first.
    async fn create_file(
        &self,
        path: &StoragePath,
        recursive: bool,
        option: CreationCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Create a folder.
    async fn create_folder(
        &self,
        path: &StoragePath,
        recursive: bool,
        option: CreationCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Delete a file.
    async fn delete_file(
        &self,
        path: &StoragePath,
        option: DeletionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Delete a folder and everything below it.
    async fn delete_folder(
        &self,
        path: &StoragePath,
        option: DeletionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Move a file. Moving onto its own location is a no-op.
    async fn move_file(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Move a folder with its subtree. Moving onto its own location is a no-op.
    async fn move_folder(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Copy a file, duplicating its content.
    async fn copy_file(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Copy a folder with its subtree.
    async fn copy_folder(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    // ========================================================================
    // Listing and metadata
    // ========================================================================

    /// Direct child files of a folder.
    async fn list_files(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<StoragePath>>;

    /// Direct child folders of a folder.
    async fn list_folders(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<StoragePath>>;

    /// Properties of a file.
    async fn file_properties(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<FileProperties>;

    /// Properties of a folder.
    async fn folder_properties(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<FolderProperties>;

    /// Attribute bits of an element of the given kind.
    async fn attributes(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        cancel: &CancellationToken,
    ) -> StorageResult<FileAttributes>;

    /// Replace the attribute bits of an element of the given kind.
    async fn set_attributes(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        attributes: FileAttributes,
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    // ========================================================================
    // Content
    // ========================================================================

    /// Open a file's content. Fails with `InUse` immediately when the access
    /// mode cannot be admitted.
    async fn open_file(
        &self,
        path: &StoragePath,
        mode: FileAccessMode,
        cancel: &CancellationToken,
    ) -> StorageResult<FileStream>;
}
