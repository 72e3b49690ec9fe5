//! File and folder handles.
//!
//! A handle is a path bound to a filesystem plus a cancellation token. It
//! holds no state of its own: every call goes straight to the filesystem, so
//! a handle to a deleted element simply reports `NotFoundSelf`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use stowage_types::{
    CreationCollisionOption, DeletionOption, ElementKind, FileAccessMode, FileAttributes,
    FileProperties, FolderProperties, KnownFolder, NameCollisionOption, StorageError,
    StorageResult, StoragePath, TextEncoding,
};

use crate::ops::FileSystem;
use crate::stream::FileStream;

fn bind(fs: &Arc<dyn FileSystem>, path: &StoragePath) -> StorageResult<()> {
    if path.file_system_id() != fs.id() {
        return Err(StorageError::invalid_argument(format!(
            "{} does not belong to file system {}",
            path,
            fs.id().short()
        )));
    }
    Ok(())
}

/// The path `name` would have next to `path`, for renames.
fn sibling(path: &StoragePath, name: &str) -> StorageResult<StoragePath> {
    StoragePath::validate_name(path.path_information(), name)?;
    let parent = path
        .full_path()
        .parent()
        .ok_or_else(|| StorageError::invalid_argument("the root folder cannot be renamed"))?;
    parent.link_str(name)
}

fn parent_folder(
    fs: &Arc<dyn FileSystem>,
    path: &StoragePath,
    cancel: &CancellationToken,
) -> Option<StorageFolder> {
    path.full_path().parent().map(|parent| StorageFolder {
        fs: Arc::clone(fs),
        path: parent,
        cancel: cancel.clone(),
    })
}

// ============================================================================
// StorageFile
// ============================================================================

/// A file on some filesystem.
#[derive(Clone)]
pub struct StorageFile {
    fs: Arc<dyn FileSystem>,
    path: StoragePath,
    cancel: CancellationToken,
}

impl StorageFile {
    /// Bind `path` to `fs`. Fails with `InvalidArgument` for a foreign path.
    pub fn new(fs: Arc<dyn FileSystem>, path: StoragePath) -> StorageResult<Self> {
        bind(&fs, &path)?;
        Ok(Self {
            fs,
            path,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `cancel` for every operation on this handle.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn sibling_handle(&self, path: StoragePath) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            path,
            cancel: self.cancel.clone(),
        }
    }

    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The containing folder, by path.
    pub fn parent(&self) -> Option<StorageFolder> {
        parent_folder(&self.fs, &self.path, &self.cancel)
    }

    pub async fn exists(&self) -> StorageResult<bool> {
        self.fs.file_exists(&self.path, &self.cancel).await
    }

    pub async fn create(
        &self,
        recursive: bool,
        option: CreationCollisionOption,
    ) -> StorageResult<()> {
        self.fs
            .create_file(&self.path, recursive, option, &self.cancel)
            .await
    }

    pub async fn delete(&self, option: DeletionOption) -> StorageResult<()> {
        self.fs.delete_file(&self.path, option, &self.cancel).await
    }

    /// Move to `destination`, returning a handle at the new location.
    pub async fn move_to(
        &self,
        destination: &StoragePath,
        option: NameCollisionOption,
    ) -> StorageResult<StorageFile> {
        self.fs
            .move_file(&self.path, destination, option, &self.cancel)
            .await?;
        Ok(self.sibling_handle(destination.clone()))
    }

    /// Copy to `destination`, returning a handle to the copy.
    pub async fn copy_to(
        &self,
        destination: &StoragePath,
        option: NameCollisionOption,
    ) -> StorageResult<StorageFile> {
        self.fs
            .copy_file(&self.path, destination, option, &self.cancel)
            .await?;
        Ok(self.sibling_handle(destination.clone()))
    }

    /// Rename within the containing folder.
    pub async fn rename(
        &self,
        name: &str,
        option: NameCollisionOption,
    ) -> StorageResult<StorageFile> {
        let destination = sibling(&self.path, name)?;
        self.move_to(&destination, option).await
    }

    pub async fn open(&self, mode: FileAccessMode) -> StorageResult<FileStream> {
        self.fs.open_file(&self.path, mode, &self.cancel).await
    }

    /// The whole content.
    pub async fn read_bytes(&self) -> StorageResult<Vec<u8>> {
        let mut stream = self.open(FileAccessMode::Read).await?;
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    /// Replace the whole content.
    pub async fn write_bytes(&self, bytes: &[u8]) -> StorageResult<()> {
        let mut stream = self.open(FileAccessMode::Write).await?;
        stream.set_len(0)?;
        if let Err(e) = stream.write_all(bytes).await {
            stream.discard();
            return Err(e.into());
        }
        stream.close();
        Ok(())
    }

    /// Content as text. Without an explicit encoding a BOM decides, else UTF-8.
    pub async fn read_text(&self, encoding: Option<TextEncoding>) -> StorageResult<String> {
        let bytes = self.read_bytes().await?;
        TextEncoding::decode_with(encoding, &bytes)
    }

    /// Replace the content with `text`, encoded without a BOM.
    pub async fn write_text(
        &self,
        text: &str,
        encoding: Option<TextEncoding>,
    ) -> StorageResult<()> {
        let bytes = encoding.unwrap_or_default().encode(text);
        self.write_bytes(&bytes).await
    }

    pub async fn properties(&self) -> StorageResult<FileProperties> {
        self.fs.file_properties(&self.path, &self.cancel).await
    }

    pub async fn attributes(&self) -> StorageResult<FileAttributes> {
        self.fs
            .attributes(&self.path, ElementKind::File, &self.cancel)
            .await
    }

    pub async fn set_attributes(&self, attributes: FileAttributes) -> StorageResult<()> {
        self.fs
            .set_attributes(&self.path, ElementKind::File, attributes, &self.cancel)
            .await
    }
}

impl fmt::Debug for StorageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageFile({})", self.path)
    }
}

impl fmt::Display for StorageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

// ============================================================================
// StorageFolder
// ============================================================================

/// A folder on some filesystem.
#[derive(Clone)]
pub struct StorageFolder {
    fs: Arc<dyn FileSystem>,
    path: StoragePath,
    cancel: CancellationToken,
}

impl StorageFolder {
    /// Bind `path` to `fs`. Fails with `InvalidArgument` for a foreign path.
    pub fn new(fs: Arc<dyn FileSystem>, path: StoragePath) -> StorageResult<Self> {
        bind(&fs, &path)?;
        Ok(Self {
            fs,
            path,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `cancel` for every operation on this handle and the handles it
    /// hands out.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn folder_handle(&self, path: StoragePath) -> StorageFolder {
        StorageFolder {
            fs: Arc::clone(&self.fs),
            path,
            cancel: self.cancel.clone(),
        }
    }

    fn file_handle(&self, path: StoragePath) -> StorageFile {
        StorageFile {
            fs: Arc::clone(&self.fs),
            path,
            cancel: self.cancel.clone(),
        }
    }

    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The containing folder, by path. `None` for the root.
    pub fn parent(&self) -> Option<StorageFolder> {
        parent_folder(&self.fs, &self.path, &self.cancel)
    }

    /// Handle to the file `name` inside this folder. Does not touch storage.
    pub fn file(&self, name: &str) -> StorageResult<StorageFile> {
        StoragePath::validate_name(self.path.path_information(), name)?;
        Ok(self.file_handle(self.path.link_str(name)?))
    }

    /// Handle to the folder `name` inside this folder. Does not touch storage.
    pub fn folder(&self, name: &str) -> StorageResult<StorageFolder> {
        StoragePath::validate_name(self.path.path_information(), name)?;
        Ok(self.folder_handle(self.path.link_str(name)?))
    }

    pub async fn exists(&self) -> StorageResult<bool> {
        self.fs.folder_exists(&self.path, &self.cancel).await
    }

    pub async fn create(
        &self,
        recursive: bool,
        option: CreationCollisionOption,
    ) -> StorageResult<()> {
        self.fs
            .create_folder(&self.path, recursive, option, &self.cancel)
            .await
    }

    /// Delete this folder and everything in it.
    pub async fn delete(&self, option: DeletionOption) -> StorageResult<()> {
        self.fs.delete_folder(&self.path, option, &self.cancel).await
    }

    pub async fn move_to(
        &self,
        destination: &StoragePath,
        option: NameCollisionOption,
    ) -> StorageResult<StorageFolder> {
        self.fs
            .move_folder(&self.path, destination, option, &self.cancel)
            .await?;
        Ok(self.folder_handle(destination.clone()))
    }

    pub async fn copy_to(
        &self,
        destination: &StoragePath,
        option: NameCollisionOption,
    ) -> StorageResult<StorageFolder> {
        self.fs
            .copy_folder(&self.path, destination, option, &self.cancel)
            .await?;
        Ok(self.folder_handle(destination.clone()))
    }

    pub async fn rename(
        &self,
        name: &str,
        option: NameCollisionOption,
    ) -> StorageResult<StorageFolder> {
        let destination = sibling(&self.path, name)?;
        self.move_to(&destination, option).await
    }

    pub async fn list_files(&self) -> StorageResult<Vec<StorageFile>> {
        let paths = self.fs.list_files(&self.path, &self.cancel).await?;
        Ok(paths.into_iter().map(|p| self.file_handle(p)).collect())
    }

    pub async fn list_folders(&self) -> StorageResult<Vec<StorageFolder>> {
        let paths = self.fs.list_folders(&self.path, &self.cancel).await?;
        Ok(paths.into_iter().map(|p| self.folder_handle(p)).collect())
    }

    pub async fn properties(&self) -> StorageResult<FolderProperties> {
        self.fs.folder_properties(&self.path, &self.cancel).await
    }

    pub async fn attributes(&self) -> StorageResult<FileAttributes> {
        self.fs
            .attributes(&self.path, ElementKind::Folder, &self.cancel)
            .await
    }

    pub async fn set_attributes(&self, attributes: FileAttributes) -> StorageResult<()> {
        self.fs
            .set_attributes(&self.path, ElementKind::Folder, attributes, &self.cancel)
            .await
    }
}

impl fmt::Debug for StorageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageFolder({})", self.path)
    }
}

impl fmt::Display for StorageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

// ============================================================================
// FileSystemExt
// ============================================================================

/// Handle constructors for a shared filesystem.
#[async_trait]
pub trait FileSystemExt {
    /// Handle to the file at `path`.
    fn file(&self, path: &str) -> StorageResult<StorageFile>;

    /// Handle to the folder at `path`.
    fn folder(&self, path: &str) -> StorageResult<StorageFolder>;

    /// Handle to the file at an existing path value.
    fn file_at(&self, path: StoragePath) -> StorageResult<StorageFile>;

    /// Handle to the folder at an existing path value.
    fn folder_at(&self, path: StoragePath) -> StorageResult<StorageFolder>;

    /// Handle to a well-known folder. The folder is not created.
    async fn known_folder(&self, folder: KnownFolder) -> StorageResult<StorageFolder>;
}

#[async_trait]
impl FileSystemExt for Arc<dyn FileSystem> {
    fn file(&self, path: &str) -> StorageResult<StorageFile> {
        StorageFile::new(Arc::clone(self), self.get_path(path)?)
    }

    fn folder(&self, path: &str) -> StorageResult<StorageFolder> {
        StorageFolder::new(Arc::clone(self), self.get_path(path)?)
    }

    fn file_at(&self, path: StoragePath) -> StorageResult<StorageFile> {
        StorageFile::new(Arc::clone(self), path)
    }

    fn folder_at(&self, path: StoragePath) -> StorageResult<StorageFolder> {
        StorageFolder::new(Arc::clone(self), path)
    }

    async fn known_folder(&self, folder: KnownFolder) -> StorageResult<StorageFolder> {
        let path = self.known_folder_path(folder).await?;
        StorageFolder::new(Arc::clone(self), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryFileSystem;
    use stowage_types::StorageErrorKind;

    fn shared() -> Arc<dyn FileSystem> {
        InMemoryFileSystem::new().into_shared()
    }

    #[tokio::test]
    async fn test_text_roundtrip_utf16() {
        let fs = shared();
        let file = fs.file("/notes.txt").unwrap();
        file.create(false, CreationCollisionOption::Fail).await.unwrap();
        file.write_text("héllo", Some(TextEncoding::Utf16Be))
            .await
            .unwrap();

        let bytes = file.read_bytes().await.unwrap();
        assert_eq!(&bytes[..2], &[0, b'h']);
        assert_eq!(
            file.read_text(Some(TextEncoding::Utf16Be)).await.unwrap(),
            "héllo"
        );
    }

    #[tokio::test]
    async fn test_read_text_detects_bom() {
        let fs = shared();
        let file = fs.file("/bom.txt").unwrap();
        file.create(false, CreationCollisionOption::Fail).await.unwrap();
        file.write_bytes(&[0xFF, 0xFE, b'o', 0, b'k', 0]).await.unwrap();
        assert_eq!(file.read_text(None).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_read_text_invalid_is_invalid_data() {
        let fs = shared();
        let file = fs.file("/bin").unwrap();
        file.create(false, CreationCollisionOption::Fail).await.unwrap();
        file.write_bytes(&[0xC3, 0x28]).await.unwrap();
        let err = file.read_text(None).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_write_bytes_truncates() {
        let fs = shared();
        let file = fs.file("/f").unwrap();
        file.create(false, CreationCollisionOption::Fail).await.unwrap();
        file.write_bytes(b"a long first version").await.unwrap();
        file.write_bytes(b"short").await.unwrap();
        assert_eq!(file.read_bytes().await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_rename_validates_name() {
        let fs = shared();
        let file = fs.file("/dir/f.txt").unwrap();
        file.create(true, CreationCollisionOption::Fail).await.unwrap();

        let err = file
            .rename("a/b", NameCollisionOption::Fail)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
        let err = file
            .rename("..", NameCollisionOption::Fail)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);

        let renamed = file
            .rename("g.txt", NameCollisionOption::Fail)
            .await
            .unwrap();
        assert_eq!(renamed.path().as_str(), "/dir/g.txt");
        assert!(!file.exists().await.unwrap());
        assert!(renamed.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_root_is_invalid() {
        let fs = shared();
        let root = fs.folder("/").unwrap();
        let err = root
            .rename("x", NameCollisionOption::Fail)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_folder_children_handles() {
        let fs = shared();
        let docs = fs.folder("/docs").unwrap();
        docs.create(false, CreationCollisionOption::Fail).await.unwrap();
        docs.file("a.txt")
            .unwrap()
            .create(false, CreationCollisionOption::Fail)
            .await
            .unwrap();
        docs.folder("sub")
            .unwrap()
            .create(false, CreationCollisionOption::Fail)
            .await
            .unwrap();

        let files = docs.list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "a.txt");
        assert_eq!(files[0].parent().unwrap().path().as_str(), "/docs");

        let folders = docs.list_folders().await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name(), "sub");
        assert!(fs.folder("/").unwrap().parent().is_none());
    }

    #[tokio::test]
    async fn test_foreign_path_rejected() {
        let fs = shared();
        let other = shared();
        let path = other.get_path("/a").unwrap();
        let err = fs.file_at(path).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_known_folder_handle() {
        let fs = shared();
        let docs = fs.known_folder(KnownFolder::Documents).await.unwrap();
        assert_eq!(docs.path().as_str(), "/home/user/Documents");
        assert!(!docs.exists().await.unwrap());
        docs.create(true, CreationCollisionOption::UseExisting)
            .await
            .unwrap();
        assert!(docs.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_handle() {
        let fs = shared();
        let cancel = CancellationToken::new();
        let folder = fs.folder("/x").unwrap().with_cancellation(cancel.clone());
        cancel.cancel();
        let err = folder
            .create(false, CreationCollisionOption::Fail)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Cancelled);

        let child = folder.file("f").unwrap();
        let err = child.exists().await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Cancelled);
    }
}
