//! In-memory filesystem.
//!
//! A single-process virtual file tree. All nodes and contents live in this
//! instance and vanish with it; nothing is ever written to disk.
//!
//! # Locking
//!
//! Two layers, always taken in this order:
//!
//! 1. the structural lock, one `RwLock<NodeIndex>` per instance. Mutations
//!    take it for writing; existence checks, listings and properties read.
//! 2. the content lock inside each file's cell. `open_file` admits on the
//!    cell while still holding the structural read lock.
//!
//! Content code never takes the structural lock.

mod content;
mod index;
mod node;

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::RwLock;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use stowage_types::{
    CreationCollisionOption, DeletionOption, ElementKind, FileAccessMode, FileAttributes,
    FileProperties, FileSystemId, FolderProperties, KnownFolder, NameCollisionOption,
    PathInformation, StorageError, StorageResult, StoragePath,
};

use crate::config::FileSystemConfig;
use crate::known_folders::{KnownFolderResolver, KnownFolderTable};
use crate::ops::FileSystem;
use crate::stream::FileStream;

use index::NodeIndex;
use node::{Node, NodeBody};

/// A path resolved against this filesystem.
#[derive(Debug)]
struct Target {
    /// Effective index key.
    key: String,
    /// Normalized form: full path without a trailing separator.
    path: StoragePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
enum Transfer {
    Move,
    Copy,
}

/// In-memory filesystem.
///
/// Thread-safe; share it as `Arc<dyn FileSystem>` via
/// [`into_shared`](Self::into_shared). All data is lost when dropped.
#[derive(Debug)]
pub struct InMemoryFileSystem {
    id: FileSystemId,
    info: Arc<PathInformation>,
    index: RwLock<NodeIndex>,
    known_folders: Arc<dyn KnownFolderResolver>,
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFileSystem {
    /// An empty Unix-flavoured filesystem with the default known folders.
    pub fn new() -> Self {
        Self::with_path_information(PathInformation::unix())
    }

    /// An empty filesystem with the given path conventions.
    pub fn with_path_information(info: PathInformation) -> Self {
        Self::build(info, Arc::new(KnownFolderTable::default_layout()))
    }

    /// An empty filesystem built from configuration.
    pub fn with_config(config: &FileSystemConfig) -> Self {
        Self::build(
            config.flavor.path_information(),
            Arc::new(config.known_folder_table()),
        )
    }

    /// Replace the known-folder resolver.
    pub fn with_known_folders(mut self, resolver: impl KnownFolderResolver + 'static) -> Self {
        self.known_folders = Arc::new(resolver);
        self
    }

    fn build(info: PathInformation, known_folders: Arc<dyn KnownFolderResolver>) -> Self {
        let id = FileSystemId::new();
        let info = Arc::new(info);
        let root = StoragePath::new_root(id, Arc::clone(&info));
        Self {
            id,
            info,
            index: RwLock::new(NodeIndex::new(root, SystemTime::now())),
            known_folders,
        }
    }

    /// Wrap in an `Arc<dyn FileSystem>` for use with the handle API.
    pub fn into_shared(self) -> Arc<dyn FileSystem> {
        Arc::new(self)
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.index.read().len()
    }

    // ========================================================================
    // Resolution helpers
    // ========================================================================

    fn check_cancel(cancel: &CancellationToken) -> StorageResult<()> {
        if cancel.is_cancelled() {
            warn!("operation cancelled");
            return Err(StorageError::Cancelled);
        }
        Ok(())
    }

    fn target(&self, path: &StoragePath) -> StorageResult<Target> {
        if path.file_system_id() != self.id {
            return Err(StorageError::invalid_argument(format!(
                "{} belongs to file system {}, not {}",
                path,
                path.file_system_id().short(),
                self.id.short()
            )));
        }
        let full = path.full_path();
        let normalized = full.try_trim_end_directory_separator().unwrap_or(full);
        let escapes = normalized
            .as_str()
            .split(self.info.directory_separator)
            .nth(1)
            .is_some_and(|first| first == self.info.parent_directory_segment);
        if escapes {
            return Err(StorageError::invalid_path(format!(
                "{} climbs above the root",
                path
            )));
        }
        Ok(Target {
            key: self.info.default_comparison.fold(normalized.as_str()),
            path: normalized,
        })
    }

    fn parent_key(index: &NodeIndex, target: &Target) -> StorageResult<String> {
        index.parent_key(&target.key).ok_or_else(|| {
            StorageError::invalid_argument(format!("{} has no parent folder", target.path))
        })
    }

    /// NotFoundSelf when the containing folder exists, else NotFoundParent.
    fn missing_error(index: &NodeIndex, target: &Target) -> StorageError {
        let parent_is_folder = index
            .parent_key(&target.key)
            .is_some_and(|k| index.kind_of(&k) == Some(ElementKind::Folder));
        if parent_is_folder {
            StorageError::not_found(target.path.to_string())
        } else {
            StorageError::parent_not_found(target.path.to_string())
        }
    }

    fn type_conflict(target: &Target, found: ElementKind, expected: ElementKind) -> StorageError {
        StorageError::type_conflict(format!(
            "{} is a {}, not a {}",
            target.path, found, expected
        ))
    }

    /// The node at `target`, which must be of `kind`.
    fn require<'a>(
        index: &'a NodeIndex,
        target: &Target,
        kind: ElementKind,
    ) -> StorageResult<&'a Node> {
        let node = index
            .get(&target.key)
            .ok_or_else(|| Self::missing_error(index, target))?;
        if node.kind() != kind {
            return Err(Self::type_conflict(target, node.kind(), kind));
        }
        Ok(node)
    }

    /// The containing folder of `target` must exist.
    fn ensure_parent(index: &NodeIndex, target: &Target) -> StorageResult<()> {
        let parent_key = Self::parent_key(index, target)?;
        match index.kind_of(&parent_key) {
            Some(ElementKind::Folder) => Ok(()),
            Some(ElementKind::File) => Err(StorageError::type_conflict(format!(
                "parent of {} is a file",
                target.path
            ))),
            None => Err(StorageError::parent_not_found(target.path.to_string())),
        }
    }

    /// Display path for a new node: the parent's display path plus the name.
    fn display_path(
        index: &NodeIndex,
        parent_key: &str,
        path: &StoragePath,
    ) -> StorageResult<StoragePath> {
        match index.get(parent_key) {
            Some(parent) => parent.path.link_str(path.name()),
            None => Ok(path.clone()),
        }
    }

    /// Create every missing ancestor folder of `target`, outermost first.
    fn ensure_ancestors(
        &self,
        index: &mut NodeIndex,
        target: &Target,
        now: SystemTime,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let mut ancestors = Vec::new();
        let mut current = target.path.parent();
        while let Some(path) = current {
            if path.is_root() {
                break;
            }
            current = path.parent();
            ancestors.push(path);
        }

        for path in ancestors.into_iter().rev() {
            Self::check_cancel(cancel)?;
            let ancestor = Target {
                key: self.info.default_comparison.fold(path.as_str()),
                path,
            };
            match index.kind_of(&ancestor.key) {
                Some(ElementKind::Folder) => continue,
                Some(ElementKind::File) => {
                    return Err(Self::type_conflict(
                        &ancestor,
                        ElementKind::File,
                        ElementKind::Folder,
                    ));
                }
                None => {
                    let parent_key = Self::parent_key(index, &ancestor)?;
                    let shown = Self::display_path(index, &parent_key, &ancestor.path)?;
                    debug!(path = %shown, "created ancestor folder");
                    index.insert(ancestor.key, Node::folder(shown, now));
                    index.touch(&parent_key, now);
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Structural operations
    // ========================================================================

    #[tracing::instrument(skip(self, cancel), name = "memfs.create")]
    fn create_node(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        recursive: bool,
        option: CreationCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let now = SystemTime::now();
        let mut index = self.index.write();

        if index.is_root(&target.key) {
            return Self::create_root(&mut index, &target, kind, option, now);
        }

        match index.kind_of(&target.key) {
            Some(existing) if existing != kind => {
                return Err(Self::type_conflict(&target, existing, kind));
            }
            Some(_) => match option {
                CreationCollisionOption::Fail => {
                    return Err(StorageError::already_exists(target.path.to_string()));
                }
                CreationCollisionOption::UseExisting => return Ok(()),
                CreationCollisionOption::ReplaceExisting => {
                    if index.subtree_in_use(&target.key) {
                        return Err(StorageError::in_use(target.path.to_string()));
                    }
                    index.remove_subtree(&target.key);
                }
            },
            None if recursive => self.ensure_ancestors(&mut index, &target, now, cancel)?,
            None => Self::ensure_parent(&index, &target)?,
        }

        let parent_key = Self::parent_key(&index, &target)?;
        let shown = Self::display_path(&index, &parent_key, &target.path)?;
        debug!(path = %shown, %kind, "created");
        index.insert(target.key, Node::new(kind, shown, now));
        index.touch(&parent_key, now);
        Ok(())
    }

    fn create_root(
        index: &mut NodeIndex,
        target: &Target,
        kind: ElementKind,
        option: CreationCollisionOption,
        now: SystemTime,
    ) -> StorageResult<()> {
        if kind == ElementKind::File {
            return Err(Self::type_conflict(target, ElementKind::Folder, kind));
        }
        match option {
            CreationCollisionOption::Fail => {
                Err(StorageError::already_exists(target.path.to_string()))
            }
            CreationCollisionOption::UseExisting => Ok(()),
            CreationCollisionOption::ReplaceExisting => {
                if index.subtree_in_use(&target.key) {
                    return Err(StorageError::in_use(target.path.to_string()));
                }
                let removed = index.remove_descendants(&target.key);
                index.touch(&target.key, now);
                debug!(removed, "cleared root folder");
                Ok(())
            }
        }
    }

    #[tracing::instrument(skip(self, cancel), name = "memfs.delete")]
    fn delete_node(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        option: DeletionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let mut index = self.index.write();

        if index.is_root(&target.key) {
            return Err(StorageError::invalid_argument(
                "the root folder cannot be deleted",
            ));
        }

        match index.kind_of(&target.key) {
            None => match option {
                DeletionOption::IgnoreMissing => Ok(()),
                DeletionOption::Fail => Err(Self::missing_error(&index, &target)),
            },
            Some(existing) if existing != kind => {
                Err(Self::type_conflict(&target, existing, kind))
            }
            Some(_) => {
                if index.subtree_in_use(&target.key) {
                    return Err(StorageError::in_use(target.path.to_string()));
                }
                let parent_key = Self::parent_key(&index, &target)?;
                let removed = index.remove_subtree(&target.key);
                index.touch(&parent_key, SystemTime::now());
                debug!(path = %target.path, removed, "deleted");
                Ok(())
            }
        }
    }

    #[tracing::instrument(skip(self, cancel), name = "memfs.transfer")]
    fn transfer_node(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        kind: ElementKind,
        option: NameCollisionOption,
        transfer: Transfer,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        Self::check_cancel(cancel)?;
        let source = self.target(path)?;
        let dest = self.target(destination)?;
        let now = SystemTime::now();
        let mut index = self.index.write();

        if transfer == Transfer::Move && index.is_root(&source.key) {
            return Err(StorageError::invalid_argument(
                "the root folder cannot be moved",
            ));
        }
        Self::require(&index, &source, kind)?;

        if source.key == dest.key {
            return match (transfer, option) {
                (Transfer::Copy, NameCollisionOption::Fail) => {
                    Err(StorageError::already_exists(dest.path.to_string()))
                }
                _ => {
                    debug!(path = %source.path, %transfer, "same location, nothing to do");
                    Ok(())
                }
            };
        }
        if index.is_within(&dest.key, &source.key) {
            return Err(StorageError::invalid_argument(format!(
                "cannot {} {} into its own subtree {}",
                transfer, source.path, dest.path
            )));
        }

        match index.kind_of(&dest.key) {
            Some(occupant) if occupant != kind => {
                return Err(Self::type_conflict(&dest, occupant, kind));
            }
            Some(_) => {
                if index.is_within(&source.key, &dest.key) {
                    return Err(StorageError::invalid_argument(format!(
                        "cannot replace {} with its own descendant {}",
                        dest.path, source.path
                    )));
                }
                match option {
                    NameCollisionOption::Fail => {
                        return Err(StorageError::already_exists(dest.path.to_string()));
                    }
                    NameCollisionOption::ReplaceExisting => {
                        if index.subtree_in_use(&dest.key) {
                            return Err(StorageError::in_use(dest.path.to_string()));
                        }
                        index.remove_subtree(&dest.key);
                    }
                }
            }
            None => Self::ensure_parent(&index, &dest)?,
        }

        let dest_parent = Self::parent_key(&index, &dest)?;
        let shown = Self::display_path(&index, &dest_parent, &dest.path)?;

        match transfer {
            Transfer::Move => {
                let source_parent = Self::parent_key(&index, &source)?;
                let moved = index.rekey_subtree(&source.key, &dest.key, &shown)?;
                index.touch(&source_parent, now);
                debug!(from = %source.path, to = %shown, moved, "moved");
            }
            Transfer::Copy => {
                let copied = index
                    .copy_subtree(&source.key, &dest.key, &shown, now, cancel)
                    .inspect_err(|e| warn!(from = %source.path, error = %e, "copy interrupted"))?;
                debug!(from = %source.path, to = %shown, copied, "copied");
            }
        }
        index.touch(&dest_parent, now);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn exists(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        Ok(self.index.read().kind_of(&target.key) == Some(kind))
    }

    fn list(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<StoragePath>> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let index = self.index.read();
        Self::require(&index, &target, ElementKind::Folder)?;
        Ok(index.children(&target.key, kind))
    }
}

#[async_trait]
impl FileSystem for InMemoryFileSystem {
    fn id(&self) -> FileSystemId {
        self.id
    }

    fn path_information(&self) -> &Arc<PathInformation> {
        &self.info
    }

    async fn known_folder_path(&self, folder: KnownFolder) -> StorageResult<StoragePath> {
        let raw = self
            .known_folders
            .resolve(folder)
            .ok_or_else(|| StorageError::not_found(format!("known folder {}", folder)))?;
        let full = self.get_path(&raw)?.full_path();
        Ok(full.try_trim_end_directory_separator().unwrap_or(full))
    }

    async fn file_exists(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        self.exists(path, ElementKind::File, cancel)
    }

    async fn folder_exists(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        self.exists(path, ElementKind::Folder, cancel)
    }

    async fn create_file(
        &self,
        path: &StoragePath,
        recursive: bool,
        option: CreationCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.create_node(path, ElementKind::File, recursive, option, cancel)
    }

    async fn create_folder(
        &self,
        path: &StoragePath,
        recursive: bool,
        option: CreationCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.create_node(path, ElementKind::Folder, recursive, option, cancel)
    }

    async fn delete_file(
        &self,
        path: &StoragePath,
        option: DeletionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.delete_node(path, ElementKind::File, option, cancel)
    }

    async fn delete_folder(
        &self,
        path: &StoragePath,
        option: DeletionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.delete_node(path, ElementKind::Folder, option, cancel)
    }

    async fn move_file(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.transfer_node(
            path,
            destination,
            ElementKind::File,
            option,
            Transfer::Move,
            cancel,
        )
    }

    async fn move_folder(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.transfer_node(
            path,
            destination,
            ElementKind::Folder,
            option,
            Transfer::Move,
            cancel,
        )
    }

    async fn copy_file(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.transfer_node(
            path,
            destination,
            ElementKind::File,
            option,
            Transfer::Copy,
            cancel,
        )
    }

    async fn copy_folder(
        &self,
        path: &StoragePath,
        destination: &StoragePath,
        option: NameCollisionOption,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.transfer_node(
            path,
            destination,
            ElementKind::Folder,
            option,
            Transfer::Copy,
            cancel,
        )
    }

    async fn list_files(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<StoragePath>> {
        self.list(path, ElementKind::File, cancel)
    }

    async fn list_folders(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<StoragePath>> {
        self.list(path, ElementKind::Folder, cancel)
    }

    async fn file_properties(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<FileProperties> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let index = self.index.read();
        let node = Self::require(&index, &target, ElementKind::File)?;
        let (modified, size) = node
            .content()
            .map(|c| (c.modified(), c.len()))
            .unwrap_or_default();
        Ok(FileProperties {
            name: node.path.name().to_string(),
            name_without_extension: node.path.name_without_extension().to_string(),
            extension: node.path.extension().map(str::to_string),
            created: node.created,
            modified,
            size,
        })
    }

    async fn folder_properties(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> StorageResult<FolderProperties> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let index = self.index.read();
        let node = Self::require(&index, &target, ElementKind::Folder)?;
        let modified = match node.body {
            NodeBody::Folder { modified } => modified,
            NodeBody::File { .. } => None,
        };
        Ok(FolderProperties {
            name: node.path.name().to_string(),
            created: node.created,
            modified,
        })
    }

    async fn attributes(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        cancel: &CancellationToken,
    ) -> StorageResult<FileAttributes> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let index = self.index.read();
        Ok(Self::require(&index, &target, kind)?.attributes)
    }

    #[tracing::instrument(skip(self, cancel), name = "memfs.set_attributes")]
    async fn set_attributes(
        &self,
        path: &StoragePath,
        kind: ElementKind,
        attributes: FileAttributes,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        let mut index = self.index.write();
        Self::require(&index, &target, kind)?;
        if let Some(node) = index.get_mut(&target.key) {
            node.attributes = node.normalize_attributes(attributes);
            debug!(attributes = ?node.attributes, "attributes updated");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, cancel), name = "memfs.open")]
    async fn open_file(
        &self,
        path: &StoragePath,
        mode: FileAccessMode,
        cancel: &CancellationToken,
    ) -> StorageResult<FileStream> {
        Self::check_cancel(cancel)?;
        let target = self.target(path)?;
        // Admit before releasing the index so the cell cannot be detached
        // between lookup and admission.
        let index = self.index.read();
        let node = Self::require(&index, &target, ElementKind::File)?;
        let cell = node.content().ok_or_else(|| {
            Self::type_conflict(&target, ElementKind::Folder, ElementKind::File)
        })?;
        let shown = node.path.to_string();

        match cell.try_admit(mode) {
            Some((bytes, lease)) => Ok(FileStream::new(shown, mode, bytes, Box::new(lease))),
            None => {
                debug!(path = %shown, %mode, "admission refused");
                Err(StorageError::in_use(shown))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use stowage_types::StorageErrorKind;

    fn fs() -> InMemoryFileSystem {
        InMemoryFileSystem::new()
    }

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    async fn write(fs: &InMemoryFileSystem, path: &str, bytes: &[u8]) {
        let p = fs.get_path(path).unwrap();
        fs.create_file(&p, true, CreationCollisionOption::ReplaceExisting, &token())
            .await
            .unwrap();
        let mut stream = fs
            .open_file(&p, FileAccessMode::Write, &token())
            .await
            .unwrap();
        stream.write_all(bytes).unwrap();
        stream.close();
    }

    async fn read(fs: &InMemoryFileSystem, path: &str) -> Vec<u8> {
        let p = fs.get_path(path).unwrap();
        let mut stream = fs.open_file(&p, FileAccessMode::Read, &token()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        buf
    }

    #[tokio::test]
    async fn test_root_always_exists() {
        let fs = fs();
        let root = fs.get_path("/").unwrap();
        assert!(fs.folder_exists(&root, &token()).await.unwrap());
        assert_eq!(fs.node_count(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_parent() {
        let fs = fs();
        let p = fs.get_path("/a/b.txt").unwrap();
        let err = fs
            .create_file(&p, false, CreationCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFoundParent);

        fs.create_file(&p, true, CreationCollisionOption::Fail, &token())
            .await
            .unwrap();
        let a = fs.get_path("/a").unwrap();
        assert!(fs.folder_exists(&a, &token()).await.unwrap());
        assert!(fs.file_exists(&p, &token()).await.unwrap());
    }

    #[tokio::test]
    async fn test_recursive_create_through_file_is_type_conflict() {
        let fs = fs();
        write(&fs, "/a", b"x").await;
        let p = fs.get_path("/a/b/c").unwrap();
        let err = fs
            .create_folder(&p, true, CreationCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::TypeConflict);
    }

    #[tokio::test]
    async fn test_file_as_parent_is_type_conflict() {
        let fs = fs();
        write(&fs, "/a", b"x").await;
        let under = fs.get_path("/a/b").unwrap();
        let err = fs
            .create_file(&under, false, CreationCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::TypeConflict);

        write(&fs, "/g", b"y").await;
        let g = fs.get_path("/g").unwrap();
        let err = fs
            .move_file(&g, &under, NameCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::TypeConflict);
        assert_eq!(read(&fs, "/a").await, b"x");
    }

    #[tokio::test]
    async fn test_ancestor_steps_check_cancellation() {
        let fs = fs();
        write(&fs, "/a/f", b"x").await;
        let cancel = token();
        cancel.cancel();
        let target = fs.target(&fs.get_path("/a/b/c/d").unwrap()).unwrap();

        let mut index = fs.index.write();
        let err = fs
            .ensure_ancestors(&mut index, &target, SystemTime::now(), &cancel)
            .unwrap_err();
        drop(index);
        assert_eq!(err.kind(), StorageErrorKind::Cancelled);
        // Root, /a and /a/f only.
        assert_eq!(fs.node_count(), 3);
    }

    #[tokio::test]
    async fn test_create_root() {
        let fs = fs();
        write(&fs, "/a/b", b"x").await;
        let root = fs.get_path("/").unwrap();
        let err = fs
            .create_folder(&root, false, CreationCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyExists);

        fs.create_folder(&root, false, CreationCollisionOption::UseExisting, &token())
            .await
            .unwrap();
        assert_eq!(fs.node_count(), 3);

        fs.create_folder(&root, false, CreationCollisionOption::ReplaceExisting, &token())
            .await
            .unwrap();
        assert_eq!(fs.node_count(), 1);
    }

    #[tokio::test]
    async fn test_escaping_root_is_invalid_path() {
        let fs = fs();
        let p = fs.get_path("/../a").unwrap();
        let err = fs.file_exists(&p, &token()).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }

    #[tokio::test]
    async fn test_foreign_path_is_invalid_argument() {
        let fs = fs();
        let other = InMemoryFileSystem::new();
        let p = other.get_path("/a").unwrap();
        let err = fs.file_exists(&p, &token()).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_delete_root_is_invalid() {
        let fs = fs();
        let root = fs.get_path("/").unwrap();
        let err = fs
            .delete_folder(&root, DeletionOption::IgnoreMissing, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_delete_missing_distinguishes_parent() {
        let fs = fs();
        let p = fs.get_path("/missing").unwrap();
        let err = fs
            .delete_file(&p, DeletionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFoundSelf);

        let p = fs.get_path("/missing/deeper").unwrap();
        let err = fs
            .delete_file(&p, DeletionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFoundParent);
    }

    #[tokio::test]
    async fn test_delete_open_file_is_in_use() {
        let fs = fs();
        write(&fs, "/d/f", b"x").await;
        let f = fs.get_path("/d/f").unwrap();
        let stream = fs.open_file(&f, FileAccessMode::Read, &token()).await.unwrap();

        let d = fs.get_path("/d").unwrap();
        let err = fs
            .delete_folder(&d, DeletionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InUse);

        drop(stream);
        fs.delete_folder(&d, DeletionOption::Fail, &token())
            .await
            .unwrap();
        assert_eq!(fs.node_count(), 1);
    }

    #[tokio::test]
    async fn test_move_into_own_subtree_is_invalid() {
        let fs = fs();
        write(&fs, "/a/f", b"x").await;
        let a = fs.get_path("/a").unwrap();
        let inner = fs.get_path("/a/inner").unwrap();
        let err = fs
            .move_folder(&a, &inner, NameCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_replace_ancestor_is_invalid() {
        let fs = fs();
        write(&fs, "/a/b/f", b"x").await;
        let b = fs.get_path("/a/b").unwrap();
        let a = fs.get_path("/a").unwrap();
        let err = fs
            .move_folder(&b, &a, NameCollisionOption::ReplaceExisting, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
        assert_eq!(read(&fs, "/a/b/f").await, b"x");
    }

    #[tokio::test]
    async fn test_move_keeps_open_stream_attached() {
        let fs = fs();
        write(&fs, "/a", b"old").await;
        let a = fs.get_path("/a").unwrap();
        let b = fs.get_path("/b").unwrap();
        let mut stream = fs.open_file(&a, FileAccessMode::Write, &token()).await.unwrap();
        fs.move_file(&a, &b, NameCollisionOption::Fail, &token())
            .await
            .unwrap();
        stream.set_len(0).unwrap();
        stream.write_all(b"new").unwrap();
        stream.close();
        assert_eq!(read(&fs, "/b").await, b"new");
    }

    #[tokio::test]
    async fn test_copy_onto_itself() {
        let fs = fs();
        write(&fs, "/f", b"x").await;
        let f = fs.get_path("/f").unwrap();
        let err = fs
            .copy_file(&f, &f, NameCollisionOption::Fail, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyExists);
        fs.copy_file(&f, &f, NameCollisionOption::ReplaceExisting, &token())
            .await
            .unwrap();
        assert_eq!(read(&fs, "/f").await, b"x");
    }

    #[tokio::test]
    async fn test_case_insensitive_keeps_display_case() {
        let fs = InMemoryFileSystem::with_path_information(PathInformation::windows());
        let docs = fs.get_path("\\Docs").unwrap();
        fs.create_folder(&docs, false, CreationCollisionOption::Fail, &token())
            .await
            .unwrap();
        let file = fs.get_path("/docs/Readme.TXT").unwrap();
        fs.create_file(&file, false, CreationCollisionOption::Fail, &token())
            .await
            .unwrap();

        let listed = fs.list_files(&docs, &token()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].as_str(), "\\Docs\\Readme.TXT");

        let shouting = fs.get_path("\\DOCS\\README.txt").unwrap();
        assert!(fs.file_exists(&shouting, &token()).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_fast() {
        let fs = fs();
        let cancel = token();
        cancel.cancel();
        let p = fs.get_path("/a").unwrap();
        let err = fs
            .create_folder(&p, false, CreationCollisionOption::Fail, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Cancelled);
        assert!(!fs.folder_exists(&p, &token()).await.unwrap());
    }

    #[tokio::test]
    async fn test_attributes_are_normalized() {
        let fs = fs();
        write(&fs, "/f", b"").await;
        let f = fs.get_path("/f").unwrap();
        fs.set_attributes(
            &f,
            ElementKind::File,
            FileAttributes::DIRECTORY | FileAttributes::HIDDEN,
            &token(),
        )
        .await
        .unwrap();
        assert_eq!(
            fs.attributes(&f, ElementKind::File, &token()).await.unwrap(),
            FileAttributes::HIDDEN
        );

        let err = fs
            .attributes(&f, ElementKind::Folder, &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::TypeConflict);
    }

    #[tokio::test]
    async fn test_known_folder_path() {
        let fs = fs().with_known_folders(
            KnownFolderTable::new().with(KnownFolder::TemporaryData, "/scratch/"),
        );
        let tmp = fs.known_folder_path(KnownFolder::TemporaryData).await.unwrap();
        assert_eq!(tmp.as_str(), "/scratch");

        let err = fs.known_folder_path(KnownFolder::Music).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFoundSelf);
    }
}
